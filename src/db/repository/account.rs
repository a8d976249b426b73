use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// Account Repository
// ============================================================================

pub struct AccountRepository;

impl AccountRepository {
    pub async fn create(
        pool: &SqlitePool,
        email: &str,
        display_name: &str,
        password_hash: &str,
    ) -> AppResult<Account> {
        let id = AccountId::generate();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, email, display_name, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, email, display_name, password_hash, created_at, updated_at
            "#,
        )
        .bind(&id)
        .bind(email)
        .bind(display_name)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .map(|d| d.is_unique_violation())
                .unwrap_or(false)
            {
                AppError::Conflict("Email already registered".to_string())
            } else {
                AppError::Database(e)
            }
        })
    }

    pub async fn find_by_id(
        executor: impl sqlx::SqliteExecutor<'_>,
        id: &AccountId,
    ) -> AppResult<Option<Account>> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, email, display_name, password_hash, created_at, updated_at
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<Account>> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, email, display_name, password_hash, created_at, updated_at
            FROM accounts
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }
}
