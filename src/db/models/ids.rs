use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Length of opaque invite codes.
pub const INVITE_CODE_LEN: usize = 32;

macro_rules! uuid_id {
    ($name:ident, $label:expr) => {
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Validate an externally supplied id. Storage keys are UUIDs, so
            /// anything that doesn't parse as one can be rejected up front.
            pub fn parse(value: &str) -> AppResult<Self> {
                Uuid::parse_str(value)
                    .map_err(|_| AppError::Validation(format!("Invalid {}: {}", $label, value)))?;
                Ok(Self(value.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

uuid_id!(AccountId, "account id");
uuid_id!(ProfileId, "profile id");
uuid_id!(CampaignId, "campaign id");
uuid_id!(OrderId, "order id");

/// Opaque single-use invite token. Fixed-length alphanumeric so lookups never
/// need to guess at the shape of a user-pasted value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct InviteCode(String);

impl InviteCode {
    pub fn generate() -> Self {
        use rand::Rng;
        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        let mut rng = rand::thread_rng();
        let code: String = (0..INVITE_CODE_LEN)
            .map(|_| {
                let idx = rng.gen_range(0..CHARSET.len());
                CHARSET[idx] as char
            })
            .collect();
        Self(code)
    }

    pub fn parse(value: &str) -> AppResult<Self> {
        if value.len() != INVITE_CODE_LEN || !value.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AppError::Validation("Invalid invite code".to_string()));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InviteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_round_trip() {
        let id = ProfileId::generate();
        let parsed = ProfileId::parse(id.as_str()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn uuid_ids_reject_garbage() {
        assert!(ProfileId::parse("not-a-uuid").is_err());
        assert!(AccountId::parse("").is_err());
    }

    #[test]
    fn invite_codes_are_fixed_length_alnum() {
        let code = InviteCode::generate();
        assert_eq!(code.as_str().len(), INVITE_CODE_LEN);
        assert!(code.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(InviteCode::parse(code.as_str()).is_ok());
    }

    #[test]
    fn invite_codes_reject_wrong_shape() {
        assert!(InviteCode::parse("short").is_err());
        assert!(InviteCode::parse(&"x".repeat(33)).is_err());
        assert!(InviteCode::parse(&"!".repeat(32)).is_err());
    }
}
