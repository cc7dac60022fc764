//! Ownership scoping predicates.
//!
//! These are the pure halves of the authorization rules: given a verified
//! caller and a row's ownership, decide ALLOW or DENY. Token validation and
//! role lookups live in the `auth` crate, which produces the [`Caller`].

use serde::{Deserialize, Serialize};

use crate::types::{Share, UserId};

/// An identity that has already been verified from a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Caller {
    user_id: UserId,
}

impl Caller {
    /// Wrap an identity taken from a validated token claim.
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

/// Outcome of an authorization predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

/// ALLOW iff the row belongs to the caller.
pub fn owns(caller: &Caller, resource_owner: UserId) -> Decision {
    (caller.user_id == resource_owner).into()
}

/// ALLOW iff the caller is the grantor or the recipient of the share.
pub fn share_party(caller: &Caller, share: &Share) -> Decision {
    share.involves(caller.user_id).into()
}
