use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;

use crate::db::models::*;
use crate::error::AppResult;
use crate::routes::auth::AuthAccount;
use crate::services::invites::InviteService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/:code/redeem", post(redeem_invite))
}

#[derive(Debug, Serialize)]
pub struct RedeemResponse {
    pub profile_id: ProfileId,
    pub permissions: Vec<Permission>,
}

/// Redeem an invite code, turning it into a share for the caller.
/// Single-use: of any number of concurrent redeemers, exactly one wins.
async fn redeem_invite(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(code): Path<String>,
) -> AppResult<Json<RedeemResponse>> {
    let code = InviteCode::parse(&code)?;

    let share = InviteService::redeem(&state, &code, &account.id).await?;

    Ok(Json(RedeemResponse {
        permissions: share.permissions().to_list(),
        profile_id: share.profile_id,
    }))
}
