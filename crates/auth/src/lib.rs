//! Authentication and Authorization
//!
//! Session tokens, secret hashing, the credential store, and the access
//! checks that turn a bearer token into a scoped [`ledger_core::Caller`].

pub mod access;
pub mod credentials;
pub mod error;
pub mod jwt;
pub mod password;

pub use access::AccessControl;
pub use credentials::CredentialStore;
pub use error::{AuthError, Result};
pub use jwt::{Claims, Clock, JwtAuth, JwtConfig, ManualClock, SystemClock, TokenError};
pub use password::{HashingConfig, SecretHasher};
