use serde::{Deserialize, Deserializer};

pub mod auth;
pub mod campaigns;
pub mod health;
pub mod invites;
pub mod orders;
pub mod profiles;
pub mod shares;

/// Deserializer for PATCH-style nullable fields: an omitted field stays None,
/// an explicit `null` becomes Some(None).
pub fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}
