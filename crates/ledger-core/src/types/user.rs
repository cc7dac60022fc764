//! User identity and role types.

use serde::{Deserialize, Serialize};

/// Server-assigned user identifier.
pub type UserId = i64;

/// Platform role. Re-read from the store on every admin check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    #[serde(alias = "user")]
    Standard,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Standard => "standard",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "standard" | "user" => Ok(Self::Standard),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// A user as seen by everything outside the credential store. Carries no secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

/// A user row including the stored secret hash.
#[derive(Clone)]
pub struct StoredUser {
    pub identity: UserIdentity,
    /// PHC-formatted one-way hash.
    pub password_hash: String,
}

impl std::fmt::Debug for StoredUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredUser")
            .field("identity", &self.identity)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Replacement values for an admin user update.
#[derive(Clone)]
pub struct UserChanges {
    pub username: String,
    /// New hash; `None` keeps the current secret.
    pub password_hash: Option<String>,
    pub role: Role,
}
