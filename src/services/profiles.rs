use std::sync::Arc;

use chrono::Utc;

use crate::db::{models::*, AccountRepository, ProfileRepository, ProfileShareRepository};
use crate::error::{AppError, AppResult};
use crate::services::access::AccessService;
use crate::AppState;

// ============================================================================
// Profile Service
// ============================================================================

pub struct ProfileService;

impl ProfileService {
    pub async fn create(
        state: &Arc<AppState>,
        owner: &AccountId,
        display_name: &str,
    ) -> AppResult<Profile> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(AppError::Validation(
                "Profile name cannot be empty".to_string(),
            ));
        }

        let profile = ProfileRepository::create(&state.db, owner, display_name).await?;
        tracing::info!("Profile {} created by account {}", profile.id, owner);
        Ok(profile)
    }

    /// Fetch a profile through the read gate; unauthorized callers see the
    /// same NotFound as for a missing profile.
    pub async fn get(
        state: &Arc<AppState>,
        profile_id: &ProfileId,
        caller: &AccountId,
    ) -> AppResult<(Profile, AccessGrant)> {
        AccessService::require_read(&state.db, profile_id, caller).await
    }

    /// Delete a profile and everything it owns. Owner-only, but idempotent:
    /// an already-deleted profile is success, since no authorization context
    /// can be derived for something that is gone.
    pub async fn delete(
        state: &Arc<AppState>,
        profile_id: &ProfileId,
        caller: &AccountId,
    ) -> AppResult<bool> {
        let profile = match ProfileRepository::find_by_id(&state.db, profile_id).await? {
            Some(profile) => profile,
            None => return Ok(true),
        };

        if &profile.owner_account_id != caller {
            return Err(AppError::Forbidden);
        }

        ProfileRepository::delete(&state.db, profile_id).await?;
        tracing::info!("Profile {} deleted by owner {}", profile_id, caller);
        Ok(true)
    }

    /// Move ownership to another account. The new owner's share (if any)
    /// becomes redundant and is removed in the same transaction, keeping
    /// ownership and sharing mutually exclusive. The former owner keeps no
    /// implicit access.
    pub async fn transfer_ownership(
        state: &Arc<AppState>,
        profile_id: &ProfileId,
        caller: &AccountId,
        new_owner: &AccountId,
    ) -> AppResult<Profile> {
        AccessService::require_owner(&state.db, profile_id, caller).await?;

        AccountRepository::find_by_id(&state.db, new_owner)
            .await?
            .ok_or_else(|| AppError::NotFound("No account found".to_string()))?;

        if new_owner == caller {
            return Err(AppError::InvalidOperation(
                "Account already owns this profile".to_string(),
            ));
        }

        let now = Utc::now().naive_utc();
        let mut tx = state.db.begin().await.map_err(AppError::Database)?;

        let changed =
            ProfileRepository::set_owner(&mut *tx, profile_id, caller, new_owner, now).await?;
        if changed == 0 {
            return Err(AppError::Conflict(
                "Profile ownership changed concurrently".to_string(),
            ));
        }

        ProfileShareRepository::delete(&mut *tx, profile_id, new_owner).await?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            "Profile {} ownership transferred: {} -> {}",
            profile_id,
            caller,
            new_owner
        );

        ProfileRepository::find_by_id(&state.db, profile_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ProfileInviteRepository, ProfileShareRepository};
    use crate::services::invites::InviteService;
    use crate::testing;

    #[tokio::test]
    async fn transfer_makes_new_owner_and_drops_their_share() {
        let state = testing::state().await;
        let old_owner = testing::account(&state, "old@example.com").await;
        let new_owner = testing::account(&state, "new@example.com").await;
        let profile = ProfileRepository::create(&state.db, &old_owner.id, "Bake Sale")
            .await
            .unwrap();

        ProfileShareRepository::upsert(
            &state.db,
            &profile.id,
            &new_owner.id,
            PermissionSet::from_flags(true, false),
            &old_owner.id,
        )
        .await
        .unwrap();

        let updated =
            ProfileService::transfer_ownership(&state, &profile.id, &old_owner.id, &new_owner.id)
                .await
                .unwrap();
        assert_eq!(updated.owner_account_id, new_owner.id);

        let grant = AccessService::evaluate(&state.db, &profile.id, &new_owner.id)
            .await
            .unwrap()
            .unwrap();
        assert!(grant.is_owner());

        // The redundant share is gone, and the former owner has no access.
        let share = ProfileShareRepository::find(&state.db, &profile.id, &new_owner.id)
            .await
            .unwrap();
        assert!(share.is_none());
        let old_grant = AccessService::evaluate(&state.db, &profile.id, &old_owner.id)
            .await
            .unwrap();
        assert!(old_grant.is_none());
    }

    #[tokio::test]
    async fn transfer_requires_existing_target_and_current_owner() {
        let state = testing::state().await;
        let owner = testing::account(&state, "owner@example.com").await;
        let other = testing::account(&state, "other@example.com").await;
        let profile = ProfileRepository::create(&state.db, &owner.id, "Bake Sale")
            .await
            .unwrap();

        let err = ProfileService::transfer_ownership(
            &state,
            &profile.id,
            &owner.id,
            &AccountId::generate(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = ProfileService::transfer_ownership(&state, &profile.id, &other.id, &other.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        let err = ProfileService::transfer_ownership(&state, &profile.id, &owner.id, &owner.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidOperation(_)));
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_cascades() {
        let state = testing::state().await;
        let owner = testing::account(&state, "owner@example.com").await;
        let grantee = testing::account(&state, "grantee@example.com").await;
        let profile = ProfileService::create(&state, &owner.id, "Bake Sale")
            .await
            .unwrap();

        ProfileShareRepository::upsert(
            &state.db,
            &profile.id,
            &grantee.id,
            PermissionSet::from_flags(true, true),
            &owner.id,
        )
        .await
        .unwrap();
        let invite =
            InviteService::create_invite(&state, &profile.id, &owner.id, &[Permission::Read], None)
                .await
                .unwrap();

        assert!(ProfileService::delete(&state, &profile.id, &owner.id)
            .await
            .unwrap());
        // Second delete: target already gone, still success.
        assert!(ProfileService::delete(&state, &profile.id, &owner.id)
            .await
            .unwrap());

        let share = ProfileShareRepository::find(&state.db, &profile.id, &grantee.id)
            .await
            .unwrap();
        assert!(share.is_none());
        let invite = ProfileInviteRepository::find_by_code(&state.db, &invite.code)
            .await
            .unwrap();
        assert!(invite.is_none());
    }

    #[tokio::test]
    async fn non_owner_cannot_delete_existing_profile() {
        let state = testing::state().await;
        let owner = testing::account(&state, "owner@example.com").await;
        let other = testing::account(&state, "other@example.com").await;
        let profile = ProfileService::create(&state, &owner.id, "Bake Sale")
            .await
            .unwrap();

        let err = ProfileService::delete(&state, &profile.id, &other.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }
}
