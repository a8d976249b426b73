use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::db::{models::*, OrderRepository, UpdateOrder};
use crate::error::{AppError, AppResult};
use crate::routes::auth::AuthAccount;
use crate::services::access::AccessService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/:order_id",
        get(get_order).put(update_order).delete(delete_order),
    )
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub customer_name: Option<String>,
    pub item_count: Option<i64>,
    pub total_cents: Option<i64>,
    // Omitted field = keep, explicit null = clear.
    #[serde(default, deserialize_with = "crate::routes::double_option")]
    pub note: Option<Option<String>>,
}

/// Unauthorized readers get the same NotFound a missing order produces.
fn order_not_found() -> AppError {
    AppError::NotFound("Order not found".to_string())
}

/// Get an order (requires READ on its profile)
async fn get_order(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(order_id): Path<String>,
) -> AppResult<Json<Order>> {
    let order_id = OrderId::parse(&order_id)?;

    let order = OrderRepository::find_by_id(&state.db, &order_id)
        .await?
        .ok_or_else(order_not_found)?;

    AccessService::require_read(&state.db, &order.profile_id, &account.id)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => order_not_found(),
            other => other,
        })?;

    Ok(Json(order))
}

/// Update an order (requires WRITE on its profile)
async fn update_order(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(order_id): Path<String>,
    Json(request): Json<UpdateOrderRequest>,
) -> AppResult<Json<Order>> {
    let order_id = OrderId::parse(&order_id)?;

    let order = OrderRepository::find_by_id(&state.db, &order_id)
        .await?
        .ok_or_else(order_not_found)?;

    AccessService::require_write(&state.db, &order.profile_id, &account.id).await?;

    if let Some(name) = &request.customer_name {
        if name.trim().is_empty() {
            return Err(AppError::Validation(
                "Customer name cannot be empty".to_string(),
            ));
        }
    }
    if matches!(request.item_count, Some(n) if n <= 0) {
        return Err(AppError::Validation(
            "Item count must be positive".to_string(),
        ));
    }
    if matches!(request.total_cents, Some(n) if n < 0) {
        return Err(AppError::Validation(
            "Order total cannot be negative".to_string(),
        ));
    }

    let updated = OrderRepository::update(
        &state.db,
        &order_id,
        UpdateOrder {
            customer_name: request.customer_name.map(|n| n.trim().to_string()),
            item_count: request.item_count,
            total_cents: request.total_cents,
            note: request.note,
        },
    )
    .await?;

    Ok(Json(updated))
}

/// Delete an order (requires WRITE; idempotent).
/// An order that is already gone is a success, not an error.
async fn delete_order(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(order_id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let order_id = OrderId::parse(&order_id)?;

    let Some(order) = OrderRepository::find_by_id(&state.db, &order_id).await? else {
        return Ok(Json(serde_json::json!({ "deleted": true })));
    };

    AccessService::require_write(&state.db, &order.profile_id, &account.id).await?;

    OrderRepository::delete(&state.db, &order_id).await?;
    tracing::info!("Order deleted: {}", order_id);

    Ok(Json(serde_json::json!({ "deleted": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{CampaignRepository, ProfileRepository};
    use crate::services::invites::InviteService;
    use crate::testing;

    #[tokio::test]
    async fn deleting_a_missing_order_is_success() {
        let state = testing::state().await;
        let owner = testing::account(&state, "owner@example.com").await;
        let profile = ProfileRepository::create(&state.db, &owner.id, "Bake Sale")
            .await
            .unwrap();
        let campaign =
            CampaignRepository::create(&state.db, &profile.id, "Spring Drive", None, None, None)
                .await
                .unwrap();
        let order = OrderRepository::create(
            &state.db,
            &campaign.id,
            &profile.id,
            "Pat",
            1,
            500,
            None,
        )
        .await
        .unwrap();

        for _ in 0..2 {
            let resp = delete_order(
                State(state.clone()),
                AuthAccount(owner.clone()),
                Path(order.id.to_string()),
            )
            .await
            .unwrap();
            assert_eq!(resp.0["deleted"], true);
        }
    }

    #[tokio::test]
    async fn concurrent_deletes_both_report_success() {
        let state = testing::state().await;
        let owner = testing::account(&state, "owner@example.com").await;
        let profile = ProfileRepository::create(&state.db, &owner.id, "Bake Sale")
            .await
            .unwrap();
        let campaign =
            CampaignRepository::create(&state.db, &profile.id, "Spring Drive", None, None, None)
                .await
                .unwrap();
        let order = OrderRepository::create(&state.db, &campaign.id, &profile.id, "Pat", 1, 500, None)
            .await
            .unwrap();

        let (ra, rb) = tokio::join!(
            delete_order(
                State(state.clone()),
                AuthAccount(owner.clone()),
                Path(order.id.to_string()),
            ),
            delete_order(
                State(state.clone()),
                AuthAccount(owner.clone()),
                Path(order.id.to_string()),
            )
        );
        assert_eq!(ra.unwrap().0["deleted"], true);
        assert_eq!(rb.unwrap().0["deleted"], true);
    }

    #[tokio::test]
    async fn concurrent_updates_last_write_wins() {
        let state = testing::state().await;
        let owner = testing::account(&state, "owner@example.com").await;
        let profile = ProfileRepository::create(&state.db, &owner.id, "Bake Sale")
            .await
            .unwrap();
        let campaign =
            CampaignRepository::create(&state.db, &profile.id, "Spring Drive", None, None, None)
                .await
                .unwrap();
        let order = OrderRepository::create(&state.db, &campaign.id, &profile.id, "Pat", 1, 500, None)
            .await
            .unwrap();

        let patch = |name: &str| UpdateOrderRequest {
            customer_name: Some(name.to_string()),
            item_count: None,
            total_cents: None,
            note: None,
        };

        let (ra, rb) = tokio::join!(
            update_order(
                State(state.clone()),
                AuthAccount(owner.clone()),
                Path(order.id.to_string()),
                Json(patch("Alice")),
            ),
            update_order(
                State(state.clone()),
                AuthAccount(owner.clone()),
                Path(order.id.to_string()),
                Json(patch("Bob")),
            )
        );
        assert!(ra.is_ok() && rb.is_ok());

        // Whichever write landed last holds; no merge, no error.
        let final_order = OrderRepository::find_by_id(&state.db, &order.id)
            .await
            .unwrap()
            .unwrap();
        assert!(final_order.customer_name == "Alice" || final_order.customer_name == "Bob");
        assert_eq!(final_order.total_cents, 500);
    }

    #[tokio::test]
    async fn redeemed_read_invite_allows_reads_but_not_mutations() {
        let state = testing::state().await;
        let owner = testing::account(&state, "owner@example.com").await;
        let redeemer = testing::account(&state, "redeemer@example.com").await;
        let profile = ProfileRepository::create(&state.db, &owner.id, "Bake Sale")
            .await
            .unwrap();
        let campaign =
            CampaignRepository::create(&state.db, &profile.id, "Spring Drive", None, None, None)
                .await
                .unwrap();
        let order = OrderRepository::create(
            &state.db,
            &campaign.id,
            &profile.id,
            "Pat",
            1,
            500,
            None,
        )
        .await
        .unwrap();

        let invite =
            InviteService::create_invite(&state, &profile.id, &owner.id, &[Permission::Read], Some(7))
                .await
                .unwrap();
        let share = InviteService::redeem(&state, &invite.code, &redeemer.id)
            .await
            .unwrap();
        assert!(share.can_read && !share.can_write);

        let fetched = get_order(
            State(state.clone()),
            AuthAccount(redeemer.clone()),
            Path(order.id.to_string()),
        )
        .await
        .unwrap();
        assert_eq!(fetched.0.id, order.id);

        let err = update_order(
            State(state.clone()),
            AuthAccount(redeemer),
            Path(order.id.to_string()),
            Json(UpdateOrderRequest {
                customer_name: Some("Sam".to_string()),
                item_count: None,
                total_cents: None,
                note: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }
}
