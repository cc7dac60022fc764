//! Credential store: user identities, hashed secrets and roles.
//!
//! This is the only component that reads password hashes. Hashing and
//! verification run on the blocking pool so concurrent logins do not
//! stall the async workers or each other.

use std::sync::Arc;
use tracing::{debug, info, warn};

use ledger_core::db::UserStore;
use ledger_core::types::{validate_username, Role, UserChanges, UserId, UserIdentity};

use crate::error::{AuthError, Result};
use crate::password::SecretHasher;

/// Well-known credentials created on first run. Rotate immediately.
pub const BOOTSTRAP_ADMIN_USERNAME: &str = "admin";
pub const BOOTSTRAP_ADMIN_SECRET: &str = "admin";

/// Demo accounts created when seeding is enabled. Each user's secret is its name.
pub const DEMO_USERS: &[&str] = &["alice", "bob"];

#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserStore>,
    hasher: SecretHasher,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserStore>, hasher: SecretHasher) -> Self {
        Self { users, hasher }
    }

    /// Check `secret` against the stored hash for `username` (case-sensitive).
    pub async fn verify(&self, username: &str, secret: &str) -> Result<UserIdentity> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(AuthError::UnknownUser)?;

        let hasher = self.hasher.clone();
        let secret = secret.to_owned();
        let hash = user.password_hash;
        let matches = tokio::task::spawn_blocking(move || hasher.verify(&secret, &hash))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))??;

        if !matches {
            debug!(user_id = user.identity.id, "Secret mismatch");
            return Err(AuthError::BadCredential);
        }
        Ok(user.identity)
    }

    /// Create a user. The secret is hashed before it reaches the store.
    pub async fn create(&self, username: &str, secret: &str, role: Role) -> Result<UserIdentity> {
        validate_username(username)?;
        if self.users.find_by_username(username).await?.is_some() {
            return Err(
                ledger_core::Error::Conflict(ledger_core::error::USERNAME_TAKEN.into()).into(),
            );
        }

        let hash = self.hash(secret).await?;
        // The unique index still decides races between concurrent creates.
        let user = self.users.insert(username, &hash, role).await?;
        info!(user_id = user.id, role = %role, "User created");
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<UserIdentity>> {
        Ok(self.users.list().await?)
    }

    pub async fn lookup(&self, id: UserId) -> Result<UserIdentity> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| ledger_core::Error::NotFound(format!("user {} not found", id)).into())
    }

    /// Replace a user's name and role, and the secret when one is given.
    pub async fn update(
        &self,
        id: UserId,
        username: &str,
        secret: Option<&str>,
        role: Role,
    ) -> Result<()> {
        validate_username(username)?;
        let password_hash = match secret {
            Some(s) => Some(self.hash(s).await?),
            None => None,
        };
        let changes = UserChanges {
            username: username.to_owned(),
            password_hash,
            role,
        };

        let rows = self.users.update(id, &changes).await?;
        if rows == 0 {
            return Err(ledger_core::Error::NotFound(format!("user {} not found", id)).into());
        }
        info!(user_id = id, role = %role, rehashed = secret.is_some(), "User updated");
        Ok(())
    }

    /// Delete a user and everything they own or share.
    pub async fn delete(&self, id: UserId) -> Result<()> {
        let rows = self.users.delete(id).await?;
        if rows == 0 {
            return Err(ledger_core::Error::NotFound(format!("user {} not found", id)).into());
        }
        info!(user_id = id, "User deleted");
        Ok(())
    }

    /// Create the default admin if no admin-role user exists yet.
    ///
    /// Returns the new identity, or `None` when an admin was already present.
    pub async fn bootstrap_admin(&self) -> Result<Option<UserIdentity>> {
        if self.users.has_admin().await? {
            debug!("Admin present, skipping bootstrap");
            return Ok(None);
        }

        let hash = self.hash(BOOTSTRAP_ADMIN_SECRET).await?;
        let created = self
            .users
            .insert_first_admin(BOOTSTRAP_ADMIN_USERNAME, &hash)
            .await?;

        match created {
            Some(ref admin) => warn!(
                user_id = admin.id,
                username = BOOTSTRAP_ADMIN_USERNAME,
                "Created default admin with well-known credentials; change the password now"
            ),
            None if !self.users.has_admin().await? => warn!(
                username = BOOTSTRAP_ADMIN_USERNAME,
                "No admin account exists and the default admin username is held by a standard user"
            ),
            None => debug!("Admin created concurrently, skipping bootstrap"),
        }
        Ok(created)
    }

    /// Whether any user currently holds the admin role.
    pub async fn has_admin(&self) -> Result<bool> {
        Ok(self.users.has_admin().await?)
    }

    /// Create standard users named in `usernames`, with the name as secret.
    /// Existing usernames are left alone. Returns how many were created.
    pub async fn seed_users(&self, usernames: &[&str]) -> Result<usize> {
        let mut created = 0;
        for name in usernames {
            match self.create(name, name, Role::Standard).await {
                Ok(_) => created += 1,
                Err(AuthError::Store(ledger_core::Error::Conflict(_))) => {
                    debug!(username = %name, "Seed user exists");
                }
                Err(e) => return Err(e),
            }
        }
        if created > 0 {
            warn!(created, "Seeded demo users with weak credentials");
        }
        Ok(created)
    }

    async fn hash(&self, secret: &str) -> Result<String> {
        let hasher = self.hasher.clone();
        let secret = secret.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }
}
