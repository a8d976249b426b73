use std::sync::Arc;

use crate::db::{models::*, AccountRepository, ProfileShareRepository};
use crate::error::{AppError, AppResult};
use crate::services::access::AccessService;
use crate::AppState;

// ============================================================================
// Share Service
// ============================================================================

/// How the target account of a share request is addressed.
pub enum ShareTarget {
    Email(String),
    Id(AccountId),
}

pub struct ShareService;

impl ShareService {
    async fn resolve_target(state: &Arc<AppState>, target: ShareTarget) -> AppResult<Account> {
        let account = match target {
            ShareTarget::Email(email) => {
                AccountRepository::find_by_email(&state.db, &email).await?
            }
            ShareTarget::Id(id) => AccountRepository::find_by_id(&state.db, &id).await?,
        };

        account.ok_or_else(|| AppError::NotFound("No account found".to_string()))
    }

    /// Create or update a share. Owner-only. Keyed by (profile, account), so
    /// repeating the call with a different permission list upgrades or
    /// downgrades the existing grant instead of duplicating it.
    pub async fn create_share(
        state: &Arc<AppState>,
        profile_id: &ProfileId,
        caller: &AccountId,
        target: ShareTarget,
        permissions: &[Permission],
    ) -> AppResult<(ProfileShare, Account)> {
        let permissions = PermissionSet::from_list(permissions)?;
        let profile = AccessService::require_owner(&state.db, profile_id, caller).await?;

        let target = Self::resolve_target(state, target).await?;

        if target.id == profile.owner_account_id {
            return Err(AppError::InvalidOperation(
                "Cannot share a profile with its owner".to_string(),
            ));
        }

        let share =
            ProfileShareRepository::upsert(&state.db, profile_id, &target.id, permissions, caller)
                .await?;

        tracing::info!(
            "Share upserted: profile {} -> account {} (read={}, write={})",
            profile_id,
            target.id,
            share.can_read,
            share.can_write
        );

        Ok((share, target))
    }

    /// Revoke a share. Owner-only and idempotent: revoking an absent share is
    /// success, because the caller's intent is already satisfied.
    pub async fn revoke_share(
        state: &Arc<AppState>,
        profile_id: &ProfileId,
        caller: &AccountId,
        target_account_id: &AccountId,
    ) -> AppResult<bool> {
        AccessService::require_owner(&state.db, profile_id, caller).await?;

        let removed =
            ProfileShareRepository::delete(&state.db, profile_id, target_account_id).await?;
        if removed > 0 {
            tracing::info!(
                "Share revoked: profile {} -> account {}",
                profile_id,
                target_account_id
            );
        }

        Ok(true)
    }

    /// All shares on a profile, with grantee info. Owner-only view; callers
    /// with no access get the same NotFound a missing profile produces.
    pub async fn list_by_profile(
        state: &Arc<AppState>,
        profile_id: &ProfileId,
        caller: &AccountId,
    ) -> AppResult<Vec<(ProfileShare, String, String)>> {
        AccessService::require_owner_view(&state.db, profile_id, caller).await?;
        ProfileShareRepository::list_with_grantee_info(&state.db, profile_id).await
    }

    /// The caller's own grants, enriched with profile display data. A shared
    /// account only ever sees its own rows here.
    pub async fn list_incoming(
        state: &Arc<AppState>,
        caller: &AccountId,
    ) -> AppResult<Vec<(ProfileShare, String, String)>> {
        ProfileShareRepository::list_for_account_with_profile_info(&state.db, caller).await
    }
}
