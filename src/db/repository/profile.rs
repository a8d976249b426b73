use chrono::NaiveDateTime;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// Profile Repository
// ============================================================================

pub struct ProfileRepository;

impl ProfileRepository {
    pub async fn create(
        pool: &SqlitePool,
        owner_account_id: &AccountId,
        display_name: &str,
    ) -> AppResult<Profile> {
        let id = ProfileId::generate();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, owner_account_id, display_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, owner_account_id, display_name, created_at, updated_at
            "#,
        )
        .bind(&id)
        .bind(owner_account_id)
        .bind(display_name)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_id(
        executor: impl sqlx::SqliteExecutor<'_>,
        id: &ProfileId,
    ) -> AppResult<Option<Profile>> {
        sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, owner_account_id, display_name, created_at, updated_at
            FROM profiles
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::Database)
    }

    pub async fn list_owned(pool: &SqlitePool, owner: &AccountId) -> AppResult<Vec<Profile>> {
        sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, owner_account_id, display_name, created_at, updated_at
            FROM profiles
            WHERE owner_account_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Move ownership, conditioned on the expected current owner so two
    /// concurrent transfers cannot both apply. Returns the number of rows
    /// changed (0 means the condition no longer held).
    pub async fn set_owner(
        executor: impl sqlx::SqliteExecutor<'_>,
        profile_id: &ProfileId,
        current_owner: &AccountId,
        new_owner: &AccountId,
        now: NaiveDateTime,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET owner_account_id = ?, updated_at = ?
            WHERE id = ? AND owner_account_id = ?
            "#,
        )
        .bind(new_owner)
        .bind(now)
        .bind(profile_id)
        .bind(current_owner)
        .execute(executor)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }

    /// Delete a profile. Shares, invites, campaigns and orders go with it via
    /// ON DELETE CASCADE.
    pub async fn delete(pool: &SqlitePool, id: &ProfileId) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }
}
