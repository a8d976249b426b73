//! Shared helpers for unit tests: an in-memory database with migrations
//! applied and quick account fixtures.

use std::str::FromStr;
use std::sync::Arc;

use crate::config::Config;
use crate::db::{models::Account, AccountRepository};
use crate::AppState;

/// App state backed by an in-memory SQLite database. A single connection
/// keeps every test deterministic.
pub async fn state_with(configure: impl FnOnce(&mut Config)) -> Arc<AppState> {
    let options = sqlx::sqlite::SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("in-memory sqlite options")
        .foreign_keys(true);

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("in-memory sqlite pool");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");

    let mut config = Config::default();
    config.jwt.secret = "test-secret".to_string();
    configure(&mut config);

    Arc::new(AppState { db: pool, config })
}

pub async fn state() -> Arc<AppState> {
    state_with(|_| {}).await
}

pub async fn account(state: &Arc<AppState>, email: &str) -> Account {
    let name = email.split('@').next().unwrap_or("account");
    AccountRepository::create(&state.db, email, name, "x")
        .await
        .expect("account fixture")
}
