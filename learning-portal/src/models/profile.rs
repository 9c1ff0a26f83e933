//! Profile and entitlement models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Admin,
}

impl Role {
    /// Unrecognized values never grant elevated access.
    pub fn from_string(s: &str) -> Self {
        match s {
            "admin" => Role::Admin,
            _ => Role::Student,
        }
    }
}

/// Entitlement snapshot read from the profile row.
///
/// Written by the account and billing flows; the gate only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Entitlement {
    pub role: Role,
    pub is_subscribed: bool,
    pub access_override: bool,
}

impl Entitlement {
    pub fn student(is_subscribed: bool, access_override: bool) -> Self {
        Self {
            role: Role::Student,
            is_subscribed,
            access_override,
        }
    }

    pub fn admin() -> Self {
        Self {
            role: Role::Admin,
            is_subscribed: false,
            access_override: false,
        }
    }
}

/// Row shape of the `profiles` table.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub role: String,
    pub is_subscribed: bool,
    pub access_override: bool,
}

impl From<ProfileRow> for Entitlement {
    fn from(row: ProfileRow) -> Self {
        Self {
            role: Role::from_string(&row.role),
            is_subscribed: row.is_subscribed,
            access_override: row.access_override,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_roles_fall_back_to_student() {
        assert_eq!(Role::from_string("admin"), Role::Admin);
        assert_eq!(Role::from_string("student"), Role::Student);
        assert_eq!(Role::from_string("Admin"), Role::Student);
        assert_eq!(Role::from_string(""), Role::Student);
    }

    #[test]
    fn profile_row_converts_to_entitlement() {
        let row = ProfileRow {
            role: "admin".to_string(),
            is_subscribed: false,
            access_override: true,
        };

        let entitlement = Entitlement::from(row);
        assert_eq!(entitlement.role, Role::Admin);
        assert!(!entitlement.is_subscribed);
        assert!(entitlement.access_override);
    }
}
