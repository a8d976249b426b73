use chrono::Utc;
use sqlx::Row;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// Profile Share Repository
// ============================================================================

pub struct ProfileShareRepository;

impl ProfileShareRepository {
    /// Idempotent upsert keyed by (profile_id, account_id). On conflict the
    /// permission flags are overwritten while the row id and created_at of the
    /// original grant are preserved.
    pub async fn upsert(
        executor: impl sqlx::SqliteExecutor<'_>,
        profile_id: &ProfileId,
        account_id: &AccountId,
        permissions: PermissionSet,
        created_by: &AccountId,
    ) -> AppResult<ProfileShare> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, ProfileShare>(
            r#"
            INSERT INTO profile_shares (
                id, profile_id, account_id, can_read, can_write, created_by, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (profile_id, account_id) DO UPDATE SET
                can_read = excluded.can_read,
                can_write = excluded.can_write,
                updated_at = excluded.updated_at
            RETURNING
                id, profile_id, account_id, can_read, can_write, created_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(profile_id)
        .bind(account_id)
        .bind(permissions.read)
        .bind(permissions.write)
        .bind(created_by)
        .bind(now)
        .bind(now)
        .fetch_one(executor)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find(
        executor: impl sqlx::SqliteExecutor<'_>,
        profile_id: &ProfileId,
        account_id: &AccountId,
    ) -> AppResult<Option<ProfileShare>> {
        sqlx::query_as::<_, ProfileShare>(
            r#"
            SELECT id, profile_id, account_id, can_read, can_write, created_by, created_at, updated_at
            FROM profile_shares
            WHERE profile_id = ? AND account_id = ?
            "#,
        )
        .bind(profile_id)
        .bind(account_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::Database)
    }

    /// Delete a share (revoke access). Returns the number of rows removed;
    /// callers treat 0 as success because the target is already gone.
    pub async fn delete(
        executor: impl sqlx::SqliteExecutor<'_>,
        profile_id: &ProfileId,
        account_id: &AccountId,
    ) -> AppResult<u64> {
        let result =
            sqlx::query("DELETE FROM profile_shares WHERE profile_id = ? AND account_id = ?")
                .bind(profile_id)
                .bind(account_id)
                .execute(executor)
                .await
                .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }

    /// List shares on a profile along with grantee account info.
    /// Returns tuples (ProfileShare, grantee_email, grantee_display_name).
    pub async fn list_with_grantee_info(
        pool: &SqlitePool,
        profile_id: &ProfileId,
    ) -> AppResult<Vec<(ProfileShare, String, String)>> {
        let rows = sqlx::query(
            r#"
            SELECT
                s.id, s.profile_id, s.account_id, s.can_read, s.can_write,
                s.created_by, s.created_at, s.updated_at,
                a.email AS grantee_email,
                a.display_name AS grantee_display_name
            FROM profile_shares s
            JOIN accounts a ON a.id = s.account_id
            WHERE s.profile_id = ?
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(profile_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)?;

        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            let share = ProfileShare {
                id: r.get("id"),
                profile_id: r.get("profile_id"),
                account_id: r.get("account_id"),
                can_read: r.get("can_read"),
                can_write: r.get("can_write"),
                created_by: r.get("created_by"),
                created_at: r.get("created_at"),
                updated_at: r.get("updated_at"),
            };

            out.push((
                share,
                r.get("grantee_email"),
                r.get("grantee_display_name"),
            ));
        }

        Ok(out)
    }

    /// List the shares granted to an account along with profile and owner
    /// display info, for the "my accessible profiles" view.
    /// Returns tuples (ProfileShare, profile_display_name, owner_display_name).
    pub async fn list_for_account_with_profile_info(
        pool: &SqlitePool,
        account_id: &AccountId,
    ) -> AppResult<Vec<(ProfileShare, String, String)>> {
        let rows = sqlx::query(
            r#"
            SELECT
                s.id, s.profile_id, s.account_id, s.can_read, s.can_write,
                s.created_by, s.created_at, s.updated_at,
                p.display_name AS profile_display_name,
                a.display_name AS owner_display_name
            FROM profile_shares s
            JOIN profiles p ON p.id = s.profile_id
            JOIN accounts a ON a.id = p.owner_account_id
            WHERE s.account_id = ?
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)?;

        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            let share = ProfileShare {
                id: r.get("id"),
                profile_id: r.get("profile_id"),
                account_id: r.get("account_id"),
                can_read: r.get("can_read"),
                can_write: r.get("can_write"),
                created_by: r.get("created_by"),
                created_at: r.get("created_at"),
                updated_at: r.get("updated_at"),
            };

            out.push((
                share,
                r.get("profile_display_name"),
                r.get("owner_display_name"),
            ));
        }

        Ok(out)
    }
}
