use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::ids::{AccountId, ProfileId};
use super::permission::PermissionSet;

// ============================================================================
// Profile Share Model
// ============================================================================

/// A revocable grant of READ and/or WRITE on a profile to a non-owner account.
/// One row per (profile, account); re-sharing the pair overwrites the flags.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ProfileShare {
    pub id: String,
    pub profile_id: ProfileId,
    pub account_id: AccountId,
    pub can_read: bool,
    pub can_write: bool,
    pub created_by: AccountId,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ProfileShare {
    pub fn permissions(&self) -> PermissionSet {
        PermissionSet::from_flags(self.can_read, self.can_write)
    }
}
