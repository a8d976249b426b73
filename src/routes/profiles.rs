use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{models::*, CampaignRepository, ProfileRepository};
use crate::error::{AppError, AppResult};
use crate::routes::auth::AuthAccount;
use crate::services::access::AccessService;
use crate::services::invites::InviteService;
use crate::services::profiles::ProfileService;
use crate::services::shares::{ShareService, ShareTarget};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_profiles).post(create_profile))
        .route("/:profile_id", get(get_profile).delete(delete_profile))
        .route("/:profile_id/transfer", post(transfer_ownership))
        // Share management (owner-only)
        .route("/:profile_id/shares", get(list_shares).post(create_share))
        .route("/:profile_id/shares/:account_id", delete(revoke_share))
        // Invite management (owner-only)
        .route("/:profile_id/invites", get(list_invites).post(create_invite))
        .route("/:profile_id/invites/:code", delete(delete_invite))
        // Campaigns scoped to a profile
        .route(
            "/:profile_id/campaigns",
            get(list_campaigns).post(create_campaign),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateProfileRequest {
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: ProfileId,
    pub owner_account_id: AccountId,
    pub display_name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        ProfileResponse {
            id: profile.id,
            owner_account_id: profile.owner_account_id,
            display_name: profile.display_name,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

/// One entry in the caller's "my accessible profiles" view: either a profile
/// they own or one shared with them.
#[derive(Debug, Serialize)]
pub struct AccessibleProfileResponse {
    pub profile_id: ProfileId,
    pub display_name: String,
    pub role: AccessRole,
    pub permissions: Vec<Permission>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_display_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessRole {
    Owner,
    Shared,
}

#[derive(Debug, Deserialize)]
pub struct TransferOwnershipRequest {
    pub new_owner_account_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateShareRequest {
    pub account_email: Option<String>,
    pub account_id: Option<String>,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub profile_id: ProfileId,
    pub account_id: AccountId,
    pub grantee_email: String,
    pub grantee_display_name: String,
    pub permissions: Vec<Permission>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct CreateInviteRequest {
    pub permissions: Vec<Permission>,
    pub expires_in_days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct InviteResponse {
    pub code: InviteCode,
    pub profile_id: ProfileId,
    pub permissions: Vec<Permission>,
    pub state: InviteState,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

impl InviteResponse {
    fn from_invite(invite: ProfileInvite, now: NaiveDateTime) -> Self {
        InviteResponse {
            state: invite.state(now),
            permissions: invite.permissions().to_list(),
            code: invite.code,
            profile_id: invite.profile_id,
            created_at: invite.created_at,
            expires_at: invite.expires_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    pub name: String,
    pub goal_cents: Option<i64>,
    pub starts_at: Option<NaiveDateTime>,
    pub ends_at: Option<NaiveDateTime>,
}

// ============================================================================
// Profile Handlers
// ============================================================================

/// Create a profile; the caller becomes its owner
async fn create_profile(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Json(request): Json<CreateProfileRequest>,
) -> AppResult<Json<ProfileResponse>> {
    let profile = ProfileService::create(&state, &account.id, &request.display_name).await?;
    Ok(Json(profile.into()))
}

/// List profiles the caller can access: owned ones plus incoming shares
async fn list_profiles(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
) -> AppResult<Json<Vec<AccessibleProfileResponse>>> {
    let mut out = Vec::new();

    for profile in ProfileRepository::list_owned(&state.db, &account.id).await? {
        out.push(AccessibleProfileResponse {
            profile_id: profile.id,
            display_name: profile.display_name,
            role: AccessRole::Owner,
            permissions: PermissionSet::FULL.to_list(),
            owner_display_name: None,
        });
    }

    for (share, profile_display, owner_display) in
        ShareService::list_incoming(&state, &account.id).await?
    {
        out.push(AccessibleProfileResponse {
            permissions: share.permissions().to_list(),
            profile_id: share.profile_id,
            display_name: profile_display,
            role: AccessRole::Shared,
            owner_display_name: Some(owner_display),
        });
    }

    Ok(Json(out))
}

/// Get a profile (requires READ access; unauthorized callers get 404)
async fn get_profile(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(profile_id): Path<String>,
) -> AppResult<Json<ProfileResponse>> {
    let profile_id = ProfileId::parse(&profile_id)?;
    let (profile, _grant) = ProfileService::get(&state, &profile_id, &account.id).await?;
    Ok(Json(profile.into()))
}

/// Delete a profile and everything under it (owner-only, idempotent)
async fn delete_profile(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(profile_id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let profile_id = ProfileId::parse(&profile_id)?;
    ProfileService::delete(&state, &profile_id, &account.id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Transfer ownership to another account (owner-only)
async fn transfer_ownership(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(profile_id): Path<String>,
    Json(request): Json<TransferOwnershipRequest>,
) -> AppResult<Json<ProfileResponse>> {
    let profile_id = ProfileId::parse(&profile_id)?;
    let new_owner = AccountId::parse(&request.new_owner_account_id)?;

    let profile =
        ProfileService::transfer_ownership(&state, &profile_id, &account.id, &new_owner).await?;
    Ok(Json(profile.into()))
}

// ============================================================================
// Share Handlers
// ============================================================================

/// Grant (or update) a share on a profile (owner-only)
async fn create_share(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(profile_id): Path<String>,
    Json(request): Json<CreateShareRequest>,
) -> AppResult<Json<ShareResponse>> {
    let profile_id = ProfileId::parse(&profile_id)?;

    let target = match (request.account_email, request.account_id) {
        (Some(email), _) => ShareTarget::Email(email.trim().to_lowercase()),
        (None, Some(id)) => ShareTarget::Id(AccountId::parse(&id)?),
        (None, None) => {
            return Err(AppError::BadRequest(
                "Either account_email or account_id is required".to_string(),
            ))
        }
    };

    let (share, grantee) =
        ShareService::create_share(&state, &profile_id, &account.id, target, &request.permissions)
            .await?;

    Ok(Json(ShareResponse {
        profile_id: share.profile_id.clone(),
        account_id: share.account_id.clone(),
        grantee_email: grantee.email,
        grantee_display_name: grantee.display_name,
        permissions: share.permissions().to_list(),
        created_at: share.created_at,
        updated_at: share.updated_at,
    }))
}

/// List all shares on a profile (owner-only view)
async fn list_shares(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(profile_id): Path<String>,
) -> AppResult<Json<Vec<ShareResponse>>> {
    let profile_id = ProfileId::parse(&profile_id)?;

    let rows = ShareService::list_by_profile(&state, &profile_id, &account.id).await?;
    let resp = rows
        .into_iter()
        .map(|(share, grantee_email, grantee_display_name)| ShareResponse {
            permissions: share.permissions().to_list(),
            profile_id: share.profile_id,
            account_id: share.account_id,
            grantee_email,
            grantee_display_name,
            created_at: share.created_at,
            updated_at: share.updated_at,
        })
        .collect();

    Ok(Json(resp))
}

/// Revoke a share (owner-only, idempotent)
async fn revoke_share(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path((profile_id, account_id)): Path<(String, String)>,
) -> AppResult<Json<serde_json::Value>> {
    let profile_id = ProfileId::parse(&profile_id)?;
    let target = AccountId::parse(&account_id)?;

    let revoked = ShareService::revoke_share(&state, &profile_id, &account.id, &target).await?;
    Ok(Json(serde_json::json!({ "revoked": revoked })))
}

// ============================================================================
// Invite Handlers
// ============================================================================

/// Create a single-use invite code (owner-only)
async fn create_invite(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(profile_id): Path<String>,
    Json(request): Json<CreateInviteRequest>,
) -> AppResult<Json<InviteResponse>> {
    let profile_id = ProfileId::parse(&profile_id)?;

    let invite = InviteService::create_invite(
        &state,
        &profile_id,
        &account.id,
        &request.permissions,
        request.expires_in_days,
    )
    .await?;

    Ok(Json(InviteResponse::from_invite(
        invite,
        Utc::now().naive_utc(),
    )))
}

/// List invites on a profile with their lifecycle state (owner-only)
async fn list_invites(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(profile_id): Path<String>,
) -> AppResult<Json<Vec<InviteResponse>>> {
    let profile_id = ProfileId::parse(&profile_id)?;
    let now = Utc::now().naive_utc();

    let invites = InviteService::list_for_profile(&state, &profile_id, &account.id).await?;
    let resp = invites
        .into_iter()
        .map(|invite| InviteResponse::from_invite(invite, now))
        .collect();

    Ok(Json(resp))
}

/// Delete an invite (owner-only, idempotent)
async fn delete_invite(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path((profile_id, code)): Path<(String, String)>,
) -> AppResult<Json<serde_json::Value>> {
    let profile_id = ProfileId::parse(&profile_id)?;
    let code = InviteCode::parse(&code)?;

    let deleted = InviteService::delete_invite(&state, &profile_id, &account.id, &code).await?;
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}

// ============================================================================
// Campaign Handlers (profile-scoped)
// ============================================================================

/// Create a campaign under a profile (requires WRITE access)
async fn create_campaign(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(profile_id): Path<String>,
    Json(request): Json<CreateCampaignRequest>,
) -> AppResult<Json<Campaign>> {
    let profile_id = ProfileId::parse(&profile_id)?;

    if request.name.trim().is_empty() {
        return Err(AppError::Validation(
            "Campaign name cannot be empty".to_string(),
        ));
    }

    AccessService::require_write(&state.db, &profile_id, &account.id).await?;

    let campaign = CampaignRepository::create(
        &state.db,
        &profile_id,
        request.name.trim(),
        request.goal_cents,
        request.starts_at,
        request.ends_at,
    )
    .await?;

    Ok(Json(campaign))
}

/// List campaigns under a profile (requires READ access)
async fn list_campaigns(
    State(state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
    Path(profile_id): Path<String>,
) -> AppResult<Json<Vec<Campaign>>> {
    let profile_id = ProfileId::parse(&profile_id)?;

    AccessService::require_read(&state.db, &profile_id, &account.id).await?;

    let campaigns = CampaignRepository::list_by_profile(&state.db, &profile_id).await?;
    Ok(Json(campaigns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn profile_listing_includes_owned_and_shared_entries() {
        let state = testing::state().await;
        let owner = testing::account(&state, "owner@example.com").await;
        let grantee = testing::account(&state, "grantee@example.com").await;
        let profile = ProfileRepository::create(&state.db, &owner.id, "Bake Sale")
            .await
            .unwrap();

        ShareService::create_share(
            &state,
            &profile.id,
            &owner.id,
            ShareTarget::Id(grantee.id.clone()),
            &[Permission::Read, Permission::Write],
        )
        .await
        .unwrap();

        let owned = list_profiles(State(state.clone()), AuthAccount(owner.clone()))
            .await
            .unwrap();
        assert_eq!(owned.0.len(), 1);
        assert!(matches!(owned.0[0].role, AccessRole::Owner));
        assert_eq!(
            owned.0[0].permissions,
            vec![Permission::Read, Permission::Write]
        );

        let shared = list_profiles(State(state.clone()), AuthAccount(grantee))
            .await
            .unwrap();
        assert_eq!(shared.0.len(), 1);
        assert!(matches!(shared.0[0].role, AccessRole::Shared));
        assert_eq!(shared.0[0].profile_id, profile.id);
        assert_eq!(
            shared.0[0].permissions,
            vec![Permission::Read, Permission::Write]
        );
        assert_eq!(
            shared.0[0].owner_display_name.as_deref(),
            Some(owner.display_name.as_str())
        );
    }
}
