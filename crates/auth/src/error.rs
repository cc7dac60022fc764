//! Error types for authentication and authorization.

use thiserror::Error;

use crate::jwt::TokenError;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid token: {0}")]
    Token(#[from] TokenError),

    /// No user with the supplied username.
    #[error("unknown user")]
    UnknownUser,

    #[error("bad credential")]
    BadCredential,

    /// Valid token, but the caller's current role does not permit the action.
    #[error("forbidden")]
    Forbidden,

    #[error("secret hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Store(#[from] ledger_core::Error),
}

impl AuthError {
    /// Failures the caller should see as "unauthorized".
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthError::MissingToken
                | AuthError::Token(_)
                | AuthError::UnknownUser
                | AuthError::BadCredential
        )
    }

    pub fn is_internal(&self) -> bool {
        match self {
            AuthError::Hashing(_) => true,
            AuthError::Token(TokenError::Signing(_)) => true,
            AuthError::Store(e) => e.is_internal(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
