//! In-memory store for tests and local demos.
//!
//! Mirrors the relational schema: usernames are unique, and deleting a user
//! cascades to that user's budgets, charges and shares (both directions).

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use super::{BudgetStore, ChargeStore, ShareStore, UserStore};
use crate::types::{
    AccessLevel, Budget, BudgetFields, Charge, ChargeFields, Role, Share, StoredUser, UserChanges,
    UserId, UserIdentity,
};
use crate::error::USERNAME_TAKEN;
use crate::{Error, Result};

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, StoredUser>,
    budgets: BTreeMap<i64, Budget>,
    charges: BTreeMap<i64, Charge>,
    shares: BTreeMap<i64, Share>,
}

impl Tables {
    fn username_taken(&self, username: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.identity.username == username && Some(u.identity.id) != except)
    }

    fn user_exists(&self, id: UserId) -> bool {
        self.users.contains_key(&id)
    }
}

/// Single-lock in-memory database implementing every store trait.
pub struct MemoryStore {
    tables: RwLock<Tables>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            next_id: AtomicI64::new(1),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn conflict() -> Error {
    Error::Conflict(USERNAME_TAKEN.to_string())
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<StoredUser>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.identity.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserIdentity>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).map(|u| u.identity.clone()))
    }

    async fn list(&self) -> Result<Vec<UserIdentity>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().map(|u| u.identity.clone()).collect())
    }

    async fn insert(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<UserIdentity> {
        let mut tables = self.tables.write().await;
        if tables.username_taken(username, None) {
            return Err(conflict());
        }

        let identity = UserIdentity {
            id: self.next_id(),
            username: username.to_string(),
            role,
        };
        tables.users.insert(
            identity.id,
            StoredUser {
                identity: identity.clone(),
                password_hash: password_hash.to_string(),
            },
        );
        Ok(identity)
    }

    async fn insert_first_admin(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<UserIdentity>> {
        let mut tables = self.tables.write().await;
        let has_admin = tables.users.values().any(|u| u.identity.role.is_admin());
        if has_admin || tables.username_taken(username, None) {
            return Ok(None);
        }

        let identity = UserIdentity {
            id: self.next_id(),
            username: username.to_string(),
            role: Role::Admin,
        };
        tables.users.insert(
            identity.id,
            StoredUser {
                identity: identity.clone(),
                password_hash: password_hash.to_string(),
            },
        );
        Ok(Some(identity))
    }

    async fn has_admin(&self) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().any(|u| u.identity.role.is_admin()))
    }

    async fn update(&self, id: UserId, changes: &UserChanges) -> Result<u64> {
        let mut tables = self.tables.write().await;
        if !tables.user_exists(id) {
            return Ok(0);
        }
        if tables.username_taken(&changes.username, Some(id)) {
            return Err(conflict());
        }

        if let Some(user) = tables.users.get_mut(&id) {
            user.identity.username = changes.username.clone();
            user.identity.role = changes.role;
            if let Some(ref hash) = changes.password_hash {
                user.password_hash = hash.clone();
            }
        }
        Ok(1)
    }

    async fn delete(&self, id: UserId) -> Result<u64> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Ok(0);
        }

        tables.budgets.retain(|_, b| b.user_id != id);
        tables.charges.retain(|_, c| c.user_id != id);
        tables.shares.retain(|_, s| !s.involves(id));
        Ok(1)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl BudgetStore for MemoryStore {
    async fn list_owned(&self, owner: UserId) -> Result<Vec<Budget>> {
        let tables = self.tables.read().await;
        Ok(tables
            .budgets
            .values()
            .filter(|b| b.user_id == owner)
            .cloned()
            .collect())
    }

    async fn insert(&self, owner: UserId, fields: &BudgetFields) -> Result<Budget> {
        let mut tables = self.tables.write().await;
        if !tables.user_exists(owner) {
            return Err(Error::NotFound("referenced user no longer exists".into()));
        }

        let budget = Budget {
            id: self.next_id(),
            name: fields.name.clone(),
            amount: fields.amount,
            category: fields.category.clone(),
            period: fields.period.clone(),
            user_id: owner,
        };
        tables.budgets.insert(budget.id, budget.clone());
        Ok(budget)
    }

    async fn update_owned(&self, owner: UserId, id: i64, fields: &BudgetFields) -> Result<u64> {
        let mut tables = self.tables.write().await;
        match tables.budgets.get_mut(&id) {
            Some(budget) if budget.user_id == owner => {
                budget.name = fields.name.clone();
                budget.amount = fields.amount;
                budget.category = fields.category.clone();
                budget.period = fields.period.clone();
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn delete_owned(&self, owner: UserId, id: i64) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let permitted = tables
            .budgets
            .get(&id)
            .is_some_and(|budget| budget.user_id == owner);
        if !permitted {
            return Ok(0);
        }
        tables.budgets.remove(&id);
        Ok(1)
    }
}

#[async_trait]
impl ChargeStore for MemoryStore {
    async fn list_owned(&self, owner: UserId) -> Result<Vec<Charge>> {
        let tables = self.tables.read().await;
        let mut charges: Vec<Charge> = tables
            .charges
            .values()
            .filter(|c| c.user_id == owner)
            .cloned()
            .collect();
        charges.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(charges)
    }

    async fn insert(&self, owner: UserId, fields: &ChargeFields) -> Result<Charge> {
        let mut tables = self.tables.write().await;
        if !tables.user_exists(owner) {
            return Err(Error::NotFound("referenced user no longer exists".into()));
        }

        let charge = Charge {
            id: self.next_id(),
            name: fields.name.clone(),
            amount: fields.amount,
            category: fields.category.clone(),
            periodical: fields.periodical.clone(),
            user_id: owner,
            created_at: Utc::now(),
        };
        tables.charges.insert(charge.id, charge.clone());
        Ok(charge)
    }

    async fn update_owned(&self, owner: UserId, id: i64, fields: &ChargeFields) -> Result<u64> {
        let mut tables = self.tables.write().await;
        match tables.charges.get_mut(&id) {
            Some(charge) if charge.user_id == owner => {
                charge.name = fields.name.clone();
                charge.amount = fields.amount;
                charge.category = fields.category.clone();
                charge.periodical = fields.periodical.clone();
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn delete_owned(&self, owner: UserId, id: i64) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let permitted = tables
            .charges
            .get(&id)
            .is_some_and(|charge| charge.user_id == owner);
        if !permitted {
            return Ok(0);
        }
        tables.charges.remove(&id);
        Ok(1)
    }
}

#[async_trait]
impl ShareStore for MemoryStore {
    async fn list_involving(&self, user: UserId) -> Result<Vec<Share>> {
        let tables = self.tables.read().await;
        Ok(tables
            .shares
            .values()
            .filter(|s| s.involves(user))
            .cloned()
            .collect())
    }

    async fn insert(
        &self,
        grantor: UserId,
        recipient: UserId,
        access: AccessLevel,
    ) -> Result<Share> {
        let mut tables = self.tables.write().await;
        if !tables.user_exists(grantor) || !tables.user_exists(recipient) {
            return Err(Error::NotFound("referenced user no longer exists".into()));
        }

        let share = Share {
            id: self.next_id(),
            grantor_id: grantor,
            recipient_id: recipient,
            access,
        };
        tables.shares.insert(share.id, share.clone());
        Ok(share)
    }

    async fn delete_involving(&self, user: UserId, id: i64) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let permitted = tables
            .shares
            .get(&id)
            .is_some_and(|share| share.involves(user));
        if !permitted {
            return Ok(0);
        }
        tables.shares.remove(&id);
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn rent() -> BudgetFields {
        BudgetFields {
            name: "Rent".into(),
            amount: Decimal::new(120000, 2),
            category: None,
            period: Some("monthly".into()),
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = MemoryStore::new();
        UserStore::insert(&store, "alice", "h", Role::Standard)
            .await
            .unwrap();

        let err = UserStore::insert(&store, "alice", "h2", Role::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(ref msg) if msg == USERNAME_TAKEN));
    }

    #[tokio::test]
    async fn test_username_lookup_is_case_sensitive() {
        let store = MemoryStore::new();
        UserStore::insert(&store, "alice", "h", Role::Standard)
            .await
            .unwrap();

        assert!(store.find_by_username("alice").await.unwrap().is_some());
        assert!(store.find_by_username("Alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_first_admin_inserted_once() {
        let store = MemoryStore::new();
        assert!(store.insert_first_admin("admin", "h").await.unwrap().is_some());
        assert!(store.insert_first_admin("admin2", "h").await.unwrap().is_none());
        assert!(store.has_admin().await.unwrap());
    }

    #[tokio::test]
    async fn test_owner_predicate_on_update_and_delete() {
        let store = MemoryStore::new();
        let alice = UserStore::insert(&store, "alice", "h", Role::Standard)
            .await
            .unwrap();
        let bob = UserStore::insert(&store, "bob", "h", Role::Standard)
            .await
            .unwrap();
        let budget = BudgetStore::insert(&store, alice.id, &rent()).await.unwrap();

        assert_eq!(
            BudgetStore::update_owned(&store, bob.id, budget.id, &rent())
                .await
                .unwrap(),
            0
        );
        assert_eq!(
            BudgetStore::delete_owned(&store, bob.id, budget.id)
                .await
                .unwrap(),
            0
        );
        assert_eq!(
            BudgetStore::list_owned(&store, alice.id).await.unwrap(),
            vec![budget]
        );
    }

    #[tokio::test]
    async fn test_user_delete_cascades() {
        let store = MemoryStore::new();
        let alice = UserStore::insert(&store, "alice", "h", Role::Standard)
            .await
            .unwrap();
        let bob = UserStore::insert(&store, "bob", "h", Role::Standard)
            .await
            .unwrap();
        BudgetStore::insert(&store, bob.id, &rent()).await.unwrap();
        ShareStore::insert(&store, alice.id, bob.id, AccessLevel::ReadOnly)
            .await
            .unwrap();
        ShareStore::insert(&store, bob.id, alice.id, AccessLevel::ReadWrite)
            .await
            .unwrap();

        assert_eq!(UserStore::delete(&store, bob.id).await.unwrap(), 1);

        assert!(BudgetStore::list_owned(&store, bob.id)
            .await
            .unwrap()
            .is_empty());
        assert!(store.list_involving(alice.id).await.unwrap().is_empty());
        assert_eq!(UserStore::delete(&store, bob.id).await.unwrap(), 0);
    }
}
