use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

// ============================================================================
// Permissions
// ============================================================================

/// A single grantable capability on a profile. READ and WRITE are independent
/// flags, not a hierarchy: WRITE does not imply READ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Permission {
    Read,
    Write,
}

/// The permission flags carried by a share or invite. Always non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionSet {
    pub read: bool,
    pub write: bool,
}

impl PermissionSet {
    /// What the owner holds, synthesized rather than stored.
    pub const FULL: PermissionSet = PermissionSet {
        read: true,
        write: true,
    };

    /// Build from a request-level permission list. Empty lists are rejected:
    /// a share with no permissions is a revoke, not a grant.
    pub fn from_list(permissions: &[Permission]) -> AppResult<Self> {
        if permissions.is_empty() {
            return Err(AppError::Validation(
                "Permissions must include at least one of READ, WRITE".to_string(),
            ));
        }
        Ok(PermissionSet {
            read: permissions.contains(&Permission::Read),
            write: permissions.contains(&Permission::Write),
        })
    }

    pub fn from_flags(read: bool, write: bool) -> Self {
        PermissionSet { read, write }
    }

    pub fn to_list(self) -> Vec<Permission> {
        let mut list = Vec::with_capacity(2);
        if self.read {
            list.push(Permission::Read);
        }
        if self.write {
            list.push(Permission::Write);
        }
        list
    }
}

/// The Permission Evaluator's verdict for a (profile, account) pair that has
/// some access. Owners get the full set and cannot be revoked; shared accounts
/// carry exactly the flags stored on their share row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessGrant {
    Owner,
    Shared(PermissionSet),
}

impl AccessGrant {
    pub fn is_owner(&self) -> bool {
        matches!(self, AccessGrant::Owner)
    }

    pub fn permissions(&self) -> PermissionSet {
        match self {
            AccessGrant::Owner => PermissionSet::FULL,
            AccessGrant::Shared(perms) => *perms,
        }
    }

    pub fn can_read(&self) -> bool {
        self.permissions().read
    }

    pub fn can_write(&self) -> bool {
        self.permissions().write
    }
}
