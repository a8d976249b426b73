use chrono::NaiveDateTime;
use sqlx::SqlitePool;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// Profile Invite Repository
// ============================================================================

/// Insert outcome, surfaced so the service layer can retry on a code
/// collision without treating it as a hard failure.
pub enum InviteInsert {
    Created(ProfileInvite),
    CodeTaken,
}

pub struct ProfileInviteRepository;

impl ProfileInviteRepository {
    pub async fn insert(
        pool: &SqlitePool,
        code: &InviteCode,
        profile_id: &ProfileId,
        permissions: PermissionSet,
        created_by: &AccountId,
        created_at: NaiveDateTime,
        expires_at: NaiveDateTime,
    ) -> AppResult<InviteInsert> {
        let result = sqlx::query_as::<_, ProfileInvite>(
            r#"
            INSERT INTO profile_invites (
                code, profile_id, can_read, can_write, created_by, created_at, expires_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING
                code, profile_id, can_read, can_write, created_by,
                created_at, expires_at, redeemed_by, redeemed_at
            "#,
        )
        .bind(code)
        .bind(profile_id)
        .bind(permissions.read)
        .bind(permissions.write)
        .bind(created_by)
        .bind(created_at)
        .bind(expires_at)
        .fetch_one(pool)
        .await;

        match result {
            Ok(invite) => Ok(InviteInsert::Created(invite)),
            Err(e)
                if e.as_database_error()
                    .map(|d| d.is_unique_violation())
                    .unwrap_or(false) =>
            {
                Ok(InviteInsert::CodeTaken)
            }
            Err(e) => Err(AppError::Database(e)),
        }
    }

    pub async fn find_by_code(
        executor: impl sqlx::SqliteExecutor<'_>,
        code: &InviteCode,
    ) -> AppResult<Option<ProfileInvite>> {
        sqlx::query_as::<_, ProfileInvite>(
            r#"
            SELECT
                code, profile_id, can_read, can_write, created_by,
                created_at, expires_at, redeemed_by, redeemed_at
            FROM profile_invites
            WHERE code = ?
            "#,
        )
        .bind(code)
        .fetch_optional(executor)
        .await
        .map_err(AppError::Database)
    }

    /// Atomically consume an invite. The WHERE clause only matches an invite
    /// that is still active, so of any number of concurrent redeemers exactly
    /// one observes rows_affected == 1.
    pub async fn mark_redeemed(
        executor: impl sqlx::SqliteExecutor<'_>,
        code: &InviteCode,
        redeemed_by: &AccountId,
        now: NaiveDateTime,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE profile_invites
            SET redeemed_by = ?, redeemed_at = ?
            WHERE code = ? AND redeemed_by IS NULL AND expires_at > ?
            "#,
        )
        .bind(redeemed_by)
        .bind(now)
        .bind(code)
        .bind(now)
        .execute(executor)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }

    pub async fn list_for_profile(
        pool: &SqlitePool,
        profile_id: &ProfileId,
    ) -> AppResult<Vec<ProfileInvite>> {
        sqlx::query_as::<_, ProfileInvite>(
            r#"
            SELECT
                code, profile_id, can_read, can_write, created_by,
                created_at, expires_at, redeemed_by, redeemed_at
            FROM profile_invites
            WHERE profile_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(profile_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn count_active(
        pool: &SqlitePool,
        profile_id: &ProfileId,
        now: NaiveDateTime,
    ) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM profile_invites
            WHERE profile_id = ? AND redeemed_by IS NULL AND expires_at > ?
            "#,
        )
        .bind(profile_id)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(count)
    }

    /// Delete an invite. Returns rows removed; 0 is fine, the invite is gone
    /// either way.
    pub async fn delete(
        pool: &SqlitePool,
        profile_id: &ProfileId,
        code: &InviteCode,
    ) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM profile_invites WHERE profile_id = ? AND code = ?")
            .bind(profile_id)
            .bind(code)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }
}
