//! Database access layer.
//!
//! Each store trait is owner-scoped: every read, update and delete takes the
//! caller's id and expresses ownership inside the statement itself, so an
//! ownership check and its mutation are a single atomic operation.

pub mod budgets;
pub mod charges;
pub mod memory;
pub mod shares;
pub mod users;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::types::{
    AccessLevel, Budget, BudgetFields, Charge, ChargeFields, Role, Share, StoredUser, UserChanges,
    UserId, UserIdentity,
};
use crate::Result;

pub use budgets::PgBudgetStore;
pub use charges::PgChargeStore;
pub use memory::MemoryStore;
pub use shares::PgShareStore;
pub use users::PgUserStore;

/// Create a PostgreSQL connection pool.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;

    Ok(pool)
}

/// Run the bundled migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

/// User rows, including secret hashes. Only the credential store reads hashes.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Case-sensitive lookup by unique username.
    async fn find_by_username(&self, username: &str) -> Result<Option<StoredUser>>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserIdentity>>;

    async fn list(&self) -> Result<Vec<UserIdentity>>;

    /// Insert a user. Fails with `Conflict` when the username is taken.
    async fn insert(&self, username: &str, password_hash: &str, role: Role)
        -> Result<UserIdentity>;

    /// Insert an admin only if no admin-role user exists, in one statement.
    async fn insert_first_admin(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<UserIdentity>>;

    async fn has_admin(&self) -> Result<bool>;

    /// Returns affected rows.
    async fn update(&self, id: UserId, changes: &UserChanges) -> Result<u64>;

    /// Returns affected rows. Owned budgets, charges and shares go with the user.
    async fn delete(&self, id: UserId) -> Result<u64>;

    /// Cheap connectivity check.
    async fn ping(&self) -> Result<()>;
}

#[async_trait]
pub trait BudgetStore: Send + Sync {
    async fn list_owned(&self, owner: UserId) -> Result<Vec<Budget>>;

    async fn insert(&self, owner: UserId, fields: &BudgetFields) -> Result<Budget>;

    /// Update the row matching `id` AND `owner`. Returns affected rows.
    async fn update_owned(&self, owner: UserId, id: i64, fields: &BudgetFields) -> Result<u64>;

    /// Delete the row matching `id` AND `owner`. Returns affected rows.
    async fn delete_owned(&self, owner: UserId, id: i64) -> Result<u64>;
}

#[async_trait]
pub trait ChargeStore: Send + Sync {
    async fn list_owned(&self, owner: UserId) -> Result<Vec<Charge>>;

    async fn insert(&self, owner: UserId, fields: &ChargeFields) -> Result<Charge>;

    async fn update_owned(&self, owner: UserId, id: i64, fields: &ChargeFields) -> Result<u64>;

    async fn delete_owned(&self, owner: UserId, id: i64) -> Result<u64>;
}

#[async_trait]
pub trait ShareStore: Send + Sync {
    /// Shares where `user` is grantor or recipient.
    async fn list_involving(&self, user: UserId) -> Result<Vec<Share>>;

    async fn insert(
        &self,
        grantor: UserId,
        recipient: UserId,
        access: AccessLevel,
    ) -> Result<Share>;

    /// Delete share `id` if `user` is one of its parties. Returns affected rows.
    async fn delete_involving(&self, user: UserId, id: i64) -> Result<u64>;
}

/// The full set of stores, shared process-wide behind `Arc`s.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub budgets: Arc<dyn BudgetStore>,
    pub charges: Arc<dyn ChargeStore>,
    pub shares: Arc<dyn ShareStore>,
}

impl Stores {
    /// Stores backed by a PostgreSQL pool.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserStore::new(pool.clone())),
            budgets: Arc::new(PgBudgetStore::new(pool.clone())),
            charges: Arc::new(PgChargeStore::new(pool.clone())),
            shares: Arc::new(PgShareStore::new(pool)),
        }
    }

    /// Stores backed by a single in-memory database (tests, local demos).
    pub fn memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            budgets: store.clone(),
            charges: store.clone(),
            shares: store,
        }
    }
}
