use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::ids::{CampaignId, OrderId, ProfileId};

// ============================================================================
// Order Model
// ============================================================================

/// A customer order recorded against a campaign. `profile_id` is denormalized
/// so the write gate can be checked without a join.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub campaign_id: CampaignId,
    pub profile_id: ProfileId,
    pub customer_name: String,
    pub item_count: i64,
    pub total_cents: i64,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
