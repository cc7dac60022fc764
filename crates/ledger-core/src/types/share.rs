//! Share relation types.

use serde::{Deserialize, Serialize};

use super::UserId;

/// Access level granted by a share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AccessLevel {
    #[default]
    ReadOnly,
    ReadWrite,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::ReadOnly => "read-only",
            AccessLevel::ReadWrite => "read-write",
        }
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "read-only" | "readonly" | "read" => Ok(Self::ReadOnly),
            "read-write" | "readwrite" | "write" => Ok(Self::ReadWrite),
            _ => Err(format!("Invalid access level: {}", s)),
        }
    }
}

/// Directed grant from `grantor_id` to `recipient_id`.
///
/// Tracked and listed, but not consulted when listing budgets or charges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub id: i64,
    pub grantor_id: UserId,
    pub recipient_id: UserId,
    pub access: AccessLevel,
}

impl Share {
    /// Whether `user_id` is one of the two parties.
    pub fn involves(&self, user_id: UserId) -> bool {
        self.grantor_id == user_id || self.recipient_id == user_id
    }
}
