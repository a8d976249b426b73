use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::db::models::*;
use crate::error::AppResult;
use crate::routes::auth::AuthAccount;
use crate::services::shares::ShareService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/incoming", get(list_incoming))
}

/// One profile shared *with* the caller, as the grantee sees it.
#[derive(Debug, Serialize)]
pub struct IncomingShareResponse {
    pub profile_id: ProfileId,
    pub profile_display_name: String,
    pub owner_display_name: String,
    pub permissions: Vec<Permission>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// List the caller's incoming shares (grants made to them by profile owners)
async fn list_incoming(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
) -> AppResult<Json<Vec<IncomingShareResponse>>> {
    let rows = ShareService::list_incoming(&state, &account.id).await?;

    let resp = rows
        .into_iter()
        .map(
            |(share, profile_display_name, owner_display_name)| IncomingShareResponse {
                permissions: share.permissions().to_list(),
                profile_id: share.profile_id,
                profile_display_name,
                owner_display_name,
                created_at: share.created_at,
                updated_at: share.updated_at,
            },
        )
        .collect();

    Ok(Json(resp))
}
