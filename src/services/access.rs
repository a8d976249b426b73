use sqlx::SqlitePool;

use crate::db::{models::*, ProfileRepository, ProfileShareRepository};
use crate::error::{AppError, AppResult};

// ============================================================================
// Access Service (permission evaluator + write-access guard)
// ============================================================================

pub struct AccessService;

impl AccessService {
    /// Effective grant for an account on an already-loaded profile.
    /// Ownership is never stored as a share row, so the owner branch short
    /// circuits before any lookup.
    pub async fn grant_for(
        pool: &SqlitePool,
        profile: &Profile,
        account_id: &AccountId,
    ) -> AppResult<Option<AccessGrant>> {
        if &profile.owner_account_id == account_id {
            return Ok(Some(AccessGrant::Owner));
        }

        let share = ProfileShareRepository::find(pool, &profile.id, account_id).await?;
        Ok(share.map(|s| AccessGrant::Shared(s.permissions())))
    }

    /// Evaluate (profile, account). Fails with NotFound when the profile does
    /// not exist; returns None when it exists but the account has no access.
    pub async fn evaluate(
        pool: &SqlitePool,
        profile_id: &ProfileId,
        account_id: &AccountId,
    ) -> AppResult<Option<AccessGrant>> {
        let profile = ProfileRepository::find_by_id(pool, profile_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

        Self::grant_for(pool, &profile, account_id).await
    }

    /// Read gate for profile-level queries. An unauthorized caller gets the
    /// same NotFound as a truly nonexistent profile, so existence is never
    /// confirmed to accounts without access.
    pub async fn require_read(
        pool: &SqlitePool,
        profile_id: &ProfileId,
        account_id: &AccountId,
    ) -> AppResult<(Profile, AccessGrant)> {
        let not_found = || AppError::NotFound("Profile not found".to_string());

        let profile = ProfileRepository::find_by_id(pool, profile_id)
            .await?
            .ok_or_else(not_found)?;

        match Self::grant_for(pool, &profile, account_id).await? {
            Some(grant) if grant.can_read() => Ok((profile, grant)),
            _ => Err(not_found()),
        }
    }

    /// Write-access guard. Every mutation on profile-owned content (campaigns,
    /// orders) calls this before touching storage. Authorization failures on
    /// mutations are always surfaced as Forbidden.
    pub async fn require_write(
        pool: &SqlitePool,
        profile_id: &ProfileId,
        account_id: &AccountId,
    ) -> AppResult<(Profile, AccessGrant)> {
        let profile = ProfileRepository::find_by_id(pool, profile_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

        match Self::grant_for(pool, &profile, account_id).await? {
            Some(grant) if grant.can_write() => Ok((profile, grant)),
            _ => {
                tracing::warn!(
                    "Write access denied: account {} on profile {}",
                    account_id,
                    profile_id
                );
                Err(AppError::Forbidden)
            }
        }
    }

    /// Owner gate for owner-only read views (share and invite listings).
    /// Callers with no access at all get the same NotFound a missing profile
    /// produces, so the listing endpoints never confirm existence. Callers who
    /// can already read the profile get Forbidden; its existence is no secret
    /// to them.
    pub async fn require_owner_view(
        pool: &SqlitePool,
        profile_id: &ProfileId,
        account_id: &AccountId,
    ) -> AppResult<Profile> {
        let not_found = || AppError::NotFound("Profile not found".to_string());

        let profile = ProfileRepository::find_by_id(pool, profile_id)
            .await?
            .ok_or_else(not_found)?;

        match Self::grant_for(pool, &profile, account_id).await? {
            Some(AccessGrant::Owner) => Ok(profile),
            Some(grant) if grant.can_read() => Err(AppError::Forbidden),
            _ => Err(not_found()),
        }
    }

    /// Owner gate for access management (shares, invites, transfer, delete).
    /// A WRITE share grants control over profile content, not profile access,
    /// so anything short of ownership is Forbidden here.
    pub async fn require_owner(
        pool: &SqlitePool,
        profile_id: &ProfileId,
        account_id: &AccountId,
    ) -> AppResult<Profile> {
        let profile = ProfileRepository::find_by_id(pool, profile_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

        if &profile.owner_account_id != account_id {
            tracing::warn!(
                "Owner-only operation denied: account {} on profile {}",
                account_id,
                profile_id
            );
            return Err(AppError::Forbidden);
        }

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn owner_always_has_full_permissions_and_no_share_row() {
        let state = testing::state().await;
        let owner = testing::account(&state, "owner@example.com").await;
        let profile = ProfileRepository::create(&state.db, &owner.id, "Bake Sale")
            .await
            .unwrap();

        let grant = AccessService::evaluate(&state.db, &profile.id, &owner.id)
            .await
            .unwrap()
            .unwrap();
        assert!(grant.is_owner());
        assert_eq!(grant.permissions(), PermissionSet::FULL);

        let share = ProfileShareRepository::find(&state.db, &profile.id, &owner.id)
            .await
            .unwrap();
        assert!(share.is_none());
    }

    #[tokio::test]
    async fn evaluate_unknown_profile_is_not_found() {
        let state = testing::state().await;
        let account = testing::account(&state, "a@example.com").await;

        let err = AccessService::evaluate(&state.db, &ProfileId::generate(), &account.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn stranger_cannot_distinguish_existing_profile_from_missing() {
        let state = testing::state().await;
        let owner = testing::account(&state, "owner@example.com").await;
        let stranger = testing::account(&state, "stranger@example.com").await;
        let profile = ProfileRepository::create(&state.db, &owner.id, "Bake Sale")
            .await
            .unwrap();

        let existing = AccessService::require_read(&state.db, &profile.id, &stranger.id)
            .await
            .unwrap_err();
        let missing = AccessService::require_read(&state.db, &ProfileId::generate(), &stranger.id)
            .await
            .unwrap_err();

        assert_eq!(existing.to_string(), missing.to_string());
    }

    #[tokio::test]
    async fn read_only_share_passes_read_gate_but_not_write_gate() {
        let state = testing::state().await;
        let owner = testing::account(&state, "owner@example.com").await;
        let reader = testing::account(&state, "reader@example.com").await;
        let profile = ProfileRepository::create(&state.db, &owner.id, "Bake Sale")
            .await
            .unwrap();
        ProfileShareRepository::upsert(
            &state.db,
            &profile.id,
            &reader.id,
            PermissionSet::from_flags(true, false),
            &owner.id,
        )
        .await
        .unwrap();

        assert!(
            AccessService::require_read(&state.db, &profile.id, &reader.id)
                .await
                .is_ok()
        );
        let err = AccessService::require_write(&state.db, &profile.id, &reader.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[tokio::test]
    async fn write_only_share_fails_read_gate() {
        let state = testing::state().await;
        let owner = testing::account(&state, "owner@example.com").await;
        let writer = testing::account(&state, "writer@example.com").await;
        let profile = ProfileRepository::create(&state.db, &owner.id, "Bake Sale")
            .await
            .unwrap();
        ProfileShareRepository::upsert(
            &state.db,
            &profile.id,
            &writer.id,
            PermissionSet::from_flags(false, true),
            &owner.id,
        )
        .await
        .unwrap();

        assert!(
            AccessService::require_write(&state.db, &profile.id, &writer.id)
                .await
                .is_ok()
        );
        let err = AccessService::require_read(&state.db, &profile.id, &writer.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn write_share_does_not_pass_owner_gate() {
        let state = testing::state().await;
        let owner = testing::account(&state, "owner@example.com").await;
        let writer = testing::account(&state, "writer@example.com").await;
        let profile = ProfileRepository::create(&state.db, &owner.id, "Bake Sale")
            .await
            .unwrap();
        ProfileShareRepository::upsert(
            &state.db,
            &profile.id,
            &writer.id,
            PermissionSet::FULL,
            &owner.id,
        )
        .await
        .unwrap();

        let err = AccessService::require_owner(&state.db, &profile.id, &writer.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }
}
