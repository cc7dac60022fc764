//! Authorization engine.
//!
//! Turns bearer tokens into verified [`Caller`]s and answers the admin and
//! ownership questions. The caller's role is always read from the user store,
//! never from the token, so a downgrade applies to the very next request.

use std::sync::Arc;
use tracing::debug;

use ledger_core::db::UserStore;
use ledger_core::scope;
use ledger_core::types::{Share, UserId};
use ledger_core::{Caller, Decision};

use crate::error::{AuthError, Result};
use crate::jwt::JwtAuth;

const BEARER: &str = "bearer";

#[derive(Clone)]
pub struct AccessControl {
    tokens: Arc<JwtAuth>,
    users: Arc<dyn UserStore>,
}

impl AccessControl {
    pub fn new(tokens: Arc<JwtAuth>, users: Arc<dyn UserStore>) -> Self {
        Self { tokens, users }
    }

    /// Resolve an `Authorization` header value (`Bearer <token>`) to a caller.
    pub fn authenticate(&self, header: Option<&str>) -> Result<Caller> {
        let header = header.map(str::trim).filter(|h| !h.is_empty());
        let header = header.ok_or(AuthError::MissingToken)?;

        let (scheme, token) = header.split_once(' ').ok_or(AuthError::MissingToken)?;
        if !scheme.eq_ignore_ascii_case(BEARER) {
            return Err(AuthError::MissingToken);
        }
        self.caller_from_token(token.trim())
    }

    pub fn caller_from_token(&self, token: &str) -> Result<Caller> {
        let user_id = self.tokens.validate(token).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            AuthError::Token(e)
        })?;
        Ok(Caller::new(user_id))
    }

    /// Whether the caller currently holds the admin role. A deleted user is not admin.
    pub async fn is_admin(&self, caller: &Caller) -> Result<bool> {
        let user = self.users.find_by_id(caller.user_id()).await?;
        Ok(user.is_some_and(|u| u.role.is_admin()))
    }

    /// Validate `token` and report whether its holder is an admin right now.
    pub async fn require_admin(&self, token: &str) -> Result<bool> {
        let caller = self.caller_from_token(token)?;
        self.is_admin(&caller).await
    }

    /// Like [`Self::is_admin`], but fails with `Forbidden` for non-admins.
    pub async fn ensure_admin(&self, caller: &Caller) -> Result<()> {
        if self.is_admin(caller).await? {
            Ok(())
        } else {
            debug!(user_id = caller.user_id(), "Admin check denied");
            Err(AuthError::Forbidden)
        }
    }

    /// ALLOW iff the token's holder owns the resource.
    pub fn scope_filter(&self, token: &str, resource_owner: UserId) -> Result<Decision> {
        let caller = self.caller_from_token(token)?;
        Ok(scope::owns(&caller, resource_owner))
    }

    /// ALLOW iff the token's holder is a party to the share.
    pub fn share_visibility(&self, token: &str, share: &Share) -> Result<Decision> {
        let caller = self.caller_from_token(token)?;
        Ok(scope::share_party(&caller, share))
    }
}
