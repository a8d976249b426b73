use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::ids::{AccountId, InviteCode, ProfileId};
use super::permission::PermissionSet;

// ============================================================================
// Profile Invite Model
// ============================================================================

/// A time-boxed, single-use token that grants a share when redeemed.
/// `redeemed_by` doubles as the consumption marker: a conditional update that
/// sets it is the only way an invite transitions out of the active state.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ProfileInvite {
    pub code: InviteCode,
    pub profile_id: ProfileId,
    pub can_read: bool,
    pub can_write: bool,
    pub created_by: AccountId,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub redeemed_by: Option<AccountId>,
    pub redeemed_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteState {
    Active,
    Redeemed,
    Expired,
}

impl ProfileInvite {
    pub fn permissions(&self) -> PermissionSet {
        PermissionSet::from_flags(self.can_read, self.can_write)
    }

    pub fn state(&self, now: NaiveDateTime) -> InviteState {
        if self.redeemed_by.is_some() {
            InviteState::Redeemed
        } else if self.expires_at <= now {
            InviteState::Expired
        } else {
            InviteState::Active
        }
    }
}
