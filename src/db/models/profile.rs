use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::ids::{AccountId, ProfileId};

// ============================================================================
// Profile Model
// ============================================================================

/// A seller/fundraiser entity. Owns campaigns and orders; access for other
/// accounts is delegated through shares and invites.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub owner_account_id: AccountId,
    pub display_name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
