use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// Order Repository
// ============================================================================

#[derive(Debug, Default)]
pub struct UpdateOrder {
    pub customer_name: Option<String>,
    pub item_count: Option<i64>,
    pub total_cents: Option<i64>,
    pub note: Option<Option<String>>,
}

pub struct OrderRepository;

impl OrderRepository {
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        pool: &SqlitePool,
        campaign_id: &CampaignId,
        profile_id: &ProfileId,
        customer_name: &str,
        item_count: i64,
        total_cents: i64,
        note: Option<&str>,
    ) -> AppResult<Order> {
        let id = OrderId::generate();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (
                id, campaign_id, profile_id, customer_name, item_count, total_cents,
                note, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING
                id, campaign_id, profile_id, customer_name, item_count, total_cents,
                note, created_at, updated_at
            "#,
        )
        .bind(&id)
        .bind(campaign_id)
        .bind(profile_id)
        .bind(customer_name)
        .bind(item_count)
        .bind(total_cents)
        .bind(note)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: &OrderId) -> AppResult<Option<Order>> {
        sqlx::query_as::<_, Order>(
            r#"
            SELECT
                id, campaign_id, profile_id, customer_name, item_count, total_cents,
                note, created_at, updated_at
            FROM orders
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn list_by_campaign(
        pool: &SqlitePool,
        campaign_id: &CampaignId,
    ) -> AppResult<Vec<Order>> {
        sqlx::query_as::<_, Order>(
            r#"
            SELECT
                id, campaign_id, profile_id, customer_name, item_count, total_cents,
                note, created_at, updated_at
            FROM orders
            WHERE campaign_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(campaign_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Field update, last-write-wins; no merge semantics.
    pub async fn update(pool: &SqlitePool, id: &OrderId, update: UpdateOrder) -> AppResult<Order> {
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET customer_name = COALESCE(?, customer_name),
                item_count = COALESCE(?, item_count),
                total_cents = COALESCE(?, total_cents),
                note = CASE WHEN ? THEN ? ELSE note END,
                updated_at = ?
            WHERE id = ?
            RETURNING
                id, campaign_id, profile_id, customer_name, item_count, total_cents,
                note, created_at, updated_at
            "#,
        )
        .bind(update.customer_name)
        .bind(update.item_count)
        .bind(update.total_cents)
        .bind(update.note.is_some())
        .bind(update.note.flatten())
        .bind(now)
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn delete(pool: &SqlitePool, id: &OrderId) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }
}
