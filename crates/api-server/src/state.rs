//! Application state shared across handlers.

use std::sync::Arc;

use auth::jwt::{JwtAuth, JwtConfig};
use auth::{AccessControl, CredentialStore, SecretHasher};
use ledger_core::db::Stores;
use ledger_core::repository::Repositories;

/// Shared application state. Built once at startup and never mutated.
#[derive(Clone)]
pub struct AppState {
    /// Store handles, used directly only for health checks.
    pub stores: Stores,
    /// Caller-scoped budget, charge and share repositories.
    pub repos: Repositories,
    /// Token issuing and validation.
    pub jwt_auth: Arc<JwtAuth>,
    /// User accounts and secret verification.
    pub credentials: CredentialStore,
    /// Bearer authentication and admin checks.
    pub access: AccessControl,
}

impl AppState {
    pub fn new(stores: Stores, jwt_auth: Arc<JwtAuth>, hasher: SecretHasher) -> Self {
        Self {
            repos: Repositories::new(&stores),
            credentials: CredentialStore::new(stores.users.clone(), hasher),
            access: AccessControl::new(jwt_auth.clone(), stores.users.clone()),
            jwt_auth,
            stores,
        }
    }

    /// State over a fresh in-memory store.
    pub fn in_memory(jwt_secret: &str, hasher: SecretHasher) -> Self {
        Self::new(
            Stores::memory(),
            Arc::new(JwtAuth::new(JwtConfig::new(jwt_secret))),
            hasher,
        )
    }
}
