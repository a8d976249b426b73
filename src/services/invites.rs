use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::db::{
    models::*, InviteInsert, ProfileInviteRepository, ProfileRepository, ProfileShareRepository,
};
use crate::error::{AppError, AppResult};
use crate::services::access::AccessService;
use crate::AppState;

// ============================================================================
// Invite Service
// ============================================================================

/// How many fresh codes to try before giving up. With 62^32 possible codes a
/// collision means something is wrong with the RNG, not bad luck.
const CODE_GENERATION_ATTEMPTS: usize = 5;

pub struct InviteService;

impl InviteService {
    /// Create a time-boxed single-use invite. Owner-only; capped per profile
    /// so a runaway client can't accumulate unbounded active codes.
    pub async fn create_invite(
        state: &Arc<AppState>,
        profile_id: &ProfileId,
        caller: &AccountId,
        permissions: &[Permission],
        expires_in_days: Option<i64>,
    ) -> AppResult<ProfileInvite> {
        let permissions = PermissionSet::from_list(permissions)?;
        AccessService::require_owner(&state.db, profile_id, caller).await?;

        let days = expires_in_days.unwrap_or(state.config.invite.default_expiry_days);
        if days <= 0 {
            return Err(AppError::Validation(
                "Invite expiry must be at least one day".to_string(),
            ));
        }

        let now = Utc::now().naive_utc();
        let active = ProfileInviteRepository::count_active(&state.db, profile_id, now).await?;
        if active >= state.config.invite.max_active_per_profile {
            return Err(AppError::Validation(format!(
                "Active invite limit reached ({})",
                state.config.invite.max_active_per_profile
            )));
        }

        let expires_at = now + Duration::days(days);

        for _ in 0..CODE_GENERATION_ATTEMPTS {
            let code = InviteCode::generate();
            match ProfileInviteRepository::insert(
                &state.db,
                &code,
                profile_id,
                permissions,
                caller,
                now,
                expires_at,
            )
            .await?
            {
                InviteInsert::Created(invite) => {
                    tracing::info!("Invite created for profile {} ({})", profile_id, code);
                    return Ok(invite);
                }
                InviteInsert::CodeTaken => {
                    tracing::warn!("Invite code collision, regenerating");
                }
            }
        }

        Err(AppError::Internal(anyhow::anyhow!(
            "Failed to generate a unique invite code"
        )))
    }

    /// Redeem an invite for the calling account. The conditional mark-used
    /// update and the share upsert commit together, so a code can produce at
    /// most one share no matter how many callers race on it.
    pub async fn redeem(
        state: &Arc<AppState>,
        code: &InviteCode,
        caller: &AccountId,
    ) -> AppResult<ProfileShare> {
        let now = Utc::now().naive_utc();

        let mut tx = state.db.begin().await.map_err(AppError::Database)?;

        let invite = ProfileInviteRepository::find_by_code(&mut *tx, code)
            .await?
            .ok_or_else(|| AppError::NotFound("Invite not found".to_string()))?;

        let profile = ProfileRepository::find_by_id(&mut *tx, &invite.profile_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Invite not found".to_string()))?;

        if &profile.owner_account_id == caller {
            return Err(AppError::InvalidOperation(
                "Cannot redeem an invite to a profile you own".to_string(),
            ));
        }

        let consumed = ProfileInviteRepository::mark_redeemed(&mut *tx, code, caller, now).await?;
        if consumed == 0 {
            return Err(AppError::Conflict(
                "Invite already used or expired".to_string(),
            ));
        }

        // Existing shares are upgraded/overwritten to the invite's permission
        // set rather than duplicated.
        let share = ProfileShareRepository::upsert(
            &mut *tx,
            &invite.profile_id,
            caller,
            invite.permissions(),
            &invite.created_by,
        )
        .await?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            "Invite {} redeemed by account {} for profile {}",
            code,
            caller,
            invite.profile_id
        );

        Ok(share)
    }

    /// Delete an invite. Owner-only; deleting an already-gone code is success.
    pub async fn delete_invite(
        state: &Arc<AppState>,
        profile_id: &ProfileId,
        caller: &AccountId,
        code: &InviteCode,
    ) -> AppResult<bool> {
        AccessService::require_owner(&state.db, profile_id, caller).await?;
        ProfileInviteRepository::delete(&state.db, profile_id, code).await?;
        Ok(true)
    }

    /// Owner-only view; callers with no access get the same NotFound a
    /// missing profile produces.
    pub async fn list_for_profile(
        state: &Arc<AppState>,
        profile_id: &ProfileId,
        caller: &AccountId,
    ) -> AppResult<Vec<ProfileInvite>> {
        AccessService::require_owner_view(&state.db, profile_id, caller).await?;
        ProfileInviteRepository::list_for_profile(&state.db, profile_id).await
    }
}
