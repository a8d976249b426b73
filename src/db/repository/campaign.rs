use chrono::{NaiveDateTime, Utc};
use sqlx::SqlitePool;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// Campaign Repository
// ============================================================================

#[derive(Debug, Default)]
pub struct UpdateCampaign {
    pub name: Option<String>,
    pub goal_cents: Option<Option<i64>>,
    pub starts_at: Option<Option<NaiveDateTime>>,
    pub ends_at: Option<Option<NaiveDateTime>>,
}

pub struct CampaignRepository;

impl CampaignRepository {
    pub async fn create(
        pool: &SqlitePool,
        profile_id: &ProfileId,
        name: &str,
        goal_cents: Option<i64>,
        starts_at: Option<NaiveDateTime>,
        ends_at: Option<NaiveDateTime>,
    ) -> AppResult<Campaign> {
        let id = CampaignId::generate();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, Campaign>(
            r#"
            INSERT INTO campaigns (
                id, profile_id, name, goal_cents, starts_at, ends_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, profile_id, name, goal_cents, starts_at, ends_at, created_at, updated_at
            "#,
        )
        .bind(&id)
        .bind(profile_id)
        .bind(name)
        .bind(goal_cents)
        .bind(starts_at)
        .bind(ends_at)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: &CampaignId) -> AppResult<Option<Campaign>> {
        sqlx::query_as::<_, Campaign>(
            r#"
            SELECT id, profile_id, name, goal_cents, starts_at, ends_at, created_at, updated_at
            FROM campaigns
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn list_by_profile(
        pool: &SqlitePool,
        profile_id: &ProfileId,
    ) -> AppResult<Vec<Campaign>> {
        sqlx::query_as::<_, Campaign>(
            r#"
            SELECT id, profile_id, name, goal_cents, starts_at, ends_at, created_at, updated_at
            FROM campaigns
            WHERE profile_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(profile_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Field update, last-write-wins. COALESCE keeps columns the caller
    /// didn't send; the nested Option distinguishes "leave as is" from
    /// "set to NULL".
    pub async fn update(
        pool: &SqlitePool,
        id: &CampaignId,
        update: UpdateCampaign,
    ) -> AppResult<Campaign> {
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, Campaign>(
            r#"
            UPDATE campaigns
            SET name = COALESCE(?, name),
                goal_cents = CASE WHEN ? THEN ? ELSE goal_cents END,
                starts_at = CASE WHEN ? THEN ? ELSE starts_at END,
                ends_at = CASE WHEN ? THEN ? ELSE ends_at END,
                updated_at = ?
            WHERE id = ?
            RETURNING id, profile_id, name, goal_cents, starts_at, ends_at, created_at, updated_at
            "#,
        )
        .bind(update.name)
        .bind(update.goal_cents.is_some())
        .bind(update.goal_cents.flatten())
        .bind(update.starts_at.is_some())
        .bind(update.starts_at.flatten())
        .bind(update.ends_at.is_some())
        .bind(update.ends_at.flatten())
        .bind(now)
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn delete(pool: &SqlitePool, id: &CampaignId) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM campaigns WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }
}
