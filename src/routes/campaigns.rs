use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::db::{models::*, CampaignRepository, OrderRepository, UpdateCampaign};
use crate::error::{AppError, AppResult};
use crate::routes::auth::AuthAccount;
use crate::services::access::AccessService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/:campaign_id",
            get(get_campaign).put(update_campaign).delete(delete_campaign),
        )
        .route("/:campaign_id/orders", get(list_orders).post(create_order))
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UpdateCampaignRequest {
    pub name: Option<String>,
    // Omitted field = keep, explicit null = clear.
    #[serde(default, deserialize_with = "crate::routes::double_option")]
    pub goal_cents: Option<Option<i64>>,
    #[serde(default, deserialize_with = "crate::routes::double_option")]
    pub starts_at: Option<Option<NaiveDateTime>>,
    #[serde(default, deserialize_with = "crate::routes::double_option")]
    pub ends_at: Option<Option<NaiveDateTime>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub item_count: i64,
    pub total_cents: i64,
    pub note: Option<String>,
}

/// Unauthorized readers get the same NotFound a missing campaign produces.
fn campaign_not_found() -> AppError {
    AppError::NotFound("Campaign not found".to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// Get a campaign (requires READ on its profile)
async fn get_campaign(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(campaign_id): Path<String>,
) -> AppResult<Json<Campaign>> {
    let campaign_id = CampaignId::parse(&campaign_id)?;

    let campaign = CampaignRepository::find_by_id(&state.db, &campaign_id)
        .await?
        .ok_or_else(campaign_not_found)?;

    AccessService::require_read(&state.db, &campaign.profile_id, &account.id)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => campaign_not_found(),
            other => other,
        })?;

    Ok(Json(campaign))
}

/// Update a campaign (requires WRITE on its profile)
async fn update_campaign(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(campaign_id): Path<String>,
    Json(request): Json<UpdateCampaignRequest>,
) -> AppResult<Json<Campaign>> {
    let campaign_id = CampaignId::parse(&campaign_id)?;

    let campaign = CampaignRepository::find_by_id(&state.db, &campaign_id)
        .await?
        .ok_or_else(campaign_not_found)?;

    AccessService::require_write(&state.db, &campaign.profile_id, &account.id).await?;

    if let Some(name) = &request.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation(
                "Campaign name cannot be empty".to_string(),
            ));
        }
    }

    let updated = CampaignRepository::update(
        &state.db,
        &campaign_id,
        UpdateCampaign {
            name: request.name.map(|n| n.trim().to_string()),
            goal_cents: request.goal_cents,
            starts_at: request.starts_at,
            ends_at: request.ends_at,
        },
    )
    .await?;

    Ok(Json(updated))
}

/// Delete a campaign and its orders (requires WRITE; idempotent).
/// A campaign that is already gone is a success, not an error.
async fn delete_campaign(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(campaign_id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let campaign_id = CampaignId::parse(&campaign_id)?;

    let Some(campaign) = CampaignRepository::find_by_id(&state.db, &campaign_id).await? else {
        return Ok(Json(serde_json::json!({ "deleted": true })));
    };

    AccessService::require_write(&state.db, &campaign.profile_id, &account.id).await?;

    CampaignRepository::delete(&state.db, &campaign_id).await?;
    tracing::info!("Campaign deleted: {}", campaign_id);

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Record an order under a campaign (requires WRITE on the profile)
async fn create_order(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(campaign_id): Path<String>,
    Json(request): Json<CreateOrderRequest>,
) -> AppResult<Json<Order>> {
    let campaign_id = CampaignId::parse(&campaign_id)?;

    let campaign = CampaignRepository::find_by_id(&state.db, &campaign_id)
        .await?
        .ok_or_else(campaign_not_found)?;

    AccessService::require_write(&state.db, &campaign.profile_id, &account.id).await?;

    if request.customer_name.trim().is_empty() {
        return Err(AppError::Validation(
            "Customer name cannot be empty".to_string(),
        ));
    }
    if request.item_count <= 0 {
        return Err(AppError::Validation(
            "Item count must be positive".to_string(),
        ));
    }
    if request.total_cents < 0 {
        return Err(AppError::Validation(
            "Order total cannot be negative".to_string(),
        ));
    }

    let order = OrderRepository::create(
        &state.db,
        &campaign_id,
        &campaign.profile_id,
        request.customer_name.trim(),
        request.item_count,
        request.total_cents,
        request.note.as_deref(),
    )
    .await?;

    Ok(Json(order))
}

/// List orders under a campaign (requires READ on the profile)
async fn list_orders(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(campaign_id): Path<String>,
) -> AppResult<Json<Vec<Order>>> {
    let campaign_id = CampaignId::parse(&campaign_id)?;

    let campaign = CampaignRepository::find_by_id(&state.db, &campaign_id)
        .await?
        .ok_or_else(campaign_not_found)?;

    AccessService::require_read(&state.db, &campaign.profile_id, &account.id)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => campaign_not_found(),
            other => other,
        })?;

    let orders = OrderRepository::list_by_campaign(&state.db, &campaign_id).await?;
    Ok(Json(orders))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ProfileRepository;
    use crate::services::shares::{ShareService, ShareTarget};
    use crate::testing;

    async fn campaign_fixture(state: &Arc<AppState>, owner: &AccountId) -> Campaign {
        let profile = ProfileRepository::create(&state.db, owner, "Bake Sale")
            .await
            .unwrap();
        CampaignRepository::create(&state.db, &profile.id, "Spring Drive", None, None, None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn write_share_grants_order_recording_until_revoked() {
        let state = testing::state().await;
        let owner = testing::account(&state, "owner@example.com").await;
        let writer = testing::account(&state, "writer@example.com").await;
        let campaign = campaign_fixture(&state, &owner.id).await;

        ShareService::create_share(
            &state,
            &campaign.profile_id,
            &owner.id,
            ShareTarget::Id(writer.id.clone()),
            &[Permission::Read, Permission::Write],
        )
        .await
        .unwrap();

        let order = create_order(
            State(state.clone()),
            AuthAccount(writer.clone()),
            Path(campaign.id.to_string()),
            Json(CreateOrderRequest {
                customer_name: "Pat".to_string(),
                item_count: 2,
                total_cents: 1500,
                note: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(order.0.campaign_id, campaign.id);

        ShareService::revoke_share(&state, &campaign.profile_id, &owner.id, &writer.id)
            .await
            .unwrap();

        let err = create_order(
            State(state.clone()),
            AuthAccount(writer),
            Path(campaign.id.to_string()),
            Json(CreateOrderRequest {
                customer_name: "Pat".to_string(),
                item_count: 1,
                total_cents: 500,
                note: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[tokio::test]
    async fn stranger_cannot_learn_a_campaign_exists() {
        let state = testing::state().await;
        let owner = testing::account(&state, "owner@example.com").await;
        let stranger = testing::account(&state, "stranger@example.com").await;
        let campaign = campaign_fixture(&state, &owner.id).await;

        let err = get_campaign(
            State(state.clone()),
            AuthAccount(stranger),
            Path(campaign.id.to_string()),
        )
        .await
        .unwrap_err();
        // Same error a truly nonexistent campaign produces.
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Campaign not found"));
    }

    #[tokio::test]
    async fn read_only_share_cannot_mutate_but_can_list() {
        let state = testing::state().await;
        let owner = testing::account(&state, "owner@example.com").await;
        let reader = testing::account(&state, "reader@example.com").await;
        let campaign = campaign_fixture(&state, &owner.id).await;

        ShareService::create_share(
            &state,
            &campaign.profile_id,
            &owner.id,
            ShareTarget::Id(reader.id.clone()),
            &[Permission::Read],
        )
        .await
        .unwrap();

        let orders = list_orders(
            State(state.clone()),
            AuthAccount(reader.clone()),
            Path(campaign.id.to_string()),
        )
        .await
        .unwrap();
        assert!(orders.0.is_empty());

        let err = delete_campaign(
            State(state.clone()),
            AuthAccount(reader),
            Path(campaign.id.to_string()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[tokio::test]
    async fn concurrent_campaign_deletes_both_report_success() {
        let state = testing::state().await;
        let owner = testing::account(&state, "owner@example.com").await;
        let campaign = campaign_fixture(&state, &owner.id).await;

        let (ra, rb) = tokio::join!(
            delete_campaign(
                State(state.clone()),
                AuthAccount(owner.clone()),
                Path(campaign.id.to_string()),
            ),
            delete_campaign(
                State(state.clone()),
                AuthAccount(owner.clone()),
                Path(campaign.id.to_string()),
            )
        );
        assert_eq!(ra.unwrap().0["deleted"], true);
        assert_eq!(rb.unwrap().0["deleted"], true);
    }

    #[tokio::test]
    async fn deleting_a_missing_campaign_is_success() {
        let state = testing::state().await;
        let owner = testing::account(&state, "owner@example.com").await;
        let campaign = campaign_fixture(&state, &owner.id).await;

        for _ in 0..2 {
            let resp = delete_campaign(
                State(state.clone()),
                AuthAccount(owner.clone()),
                Path(campaign.id.to_string()),
            )
            .await
            .unwrap();
            assert_eq!(resp.0["deleted"], true);
        }
    }
}
