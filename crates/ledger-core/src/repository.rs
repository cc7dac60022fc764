//! Caller-scoped resource repositories.
//!
//! The repositories are the only entry point handlers use for budgets,
//! charges and shares. Owners are always taken from the [`Caller`], never
//! from input, and an update or delete that touches zero rows is reported as
//! `NotFound` whether the row is missing or belongs to someone else.

use std::sync::Arc;
use tracing::{debug, info};

use crate::db::{BudgetStore, ChargeStore, ShareStore, Stores, UserStore};
use crate::scope::{self, Caller};
use crate::types::{AccessLevel, Budget, BudgetFields, Charge, ChargeFields, Share};
use crate::{Error, Result};

fn require_affected(rows: u64, kind: &str, id: i64) -> Result<u64> {
    if rows == 0 {
        return Err(Error::NotFound(format!("{} {} not found", kind, id)));
    }
    Ok(rows)
}

/// Budget operations for an authenticated caller.
#[derive(Clone)]
pub struct BudgetRepository {
    store: Arc<dyn BudgetStore>,
}

impl BudgetRepository {
    pub fn new(store: Arc<dyn BudgetStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, caller: &Caller) -> Result<Vec<Budget>> {
        let budgets = self.store.list_owned(caller.user_id()).await?;
        Ok(budgets
            .into_iter()
            .filter(|b| scope::owns(caller, b.user_id).is_allowed())
            .collect())
    }

    pub async fn create(&self, caller: &Caller, fields: &BudgetFields) -> Result<Budget> {
        let fields = fields.validated()?;
        let budget = self.store.insert(caller.user_id(), &fields).await?;
        info!(budget_id = budget.id, user_id = caller.user_id(), "Budget created");
        Ok(budget)
    }

    pub async fn update(&self, caller: &Caller, id: i64, fields: &BudgetFields) -> Result<u64> {
        let fields = fields.validated()?;
        let rows = self
            .store
            .update_owned(caller.user_id(), id, &fields)
            .await?;
        debug!(budget_id = id, user_id = caller.user_id(), rows, "Budget update");
        require_affected(rows, "budget", id)
    }

    pub async fn delete(&self, caller: &Caller, id: i64) -> Result<u64> {
        let rows = self.store.delete_owned(caller.user_id(), id).await?;
        debug!(budget_id = id, user_id = caller.user_id(), rows, "Budget delete");
        require_affected(rows, "budget", id)
    }
}

/// Charge operations for an authenticated caller.
#[derive(Clone)]
pub struct ChargeRepository {
    store: Arc<dyn ChargeStore>,
}

impl ChargeRepository {
    pub fn new(store: Arc<dyn ChargeStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, caller: &Caller) -> Result<Vec<Charge>> {
        let charges = self.store.list_owned(caller.user_id()).await?;
        Ok(charges
            .into_iter()
            .filter(|c| scope::owns(caller, c.user_id).is_allowed())
            .collect())
    }

    pub async fn create(&self, caller: &Caller, fields: &ChargeFields) -> Result<Charge> {
        let fields = fields.validated()?;
        let charge = self.store.insert(caller.user_id(), &fields).await?;
        info!(charge_id = charge.id, user_id = caller.user_id(), "Charge created");
        Ok(charge)
    }

    pub async fn update(&self, caller: &Caller, id: i64, fields: &ChargeFields) -> Result<u64> {
        let fields = fields.validated()?;
        let rows = self
            .store
            .update_owned(caller.user_id(), id, &fields)
            .await?;
        debug!(charge_id = id, user_id = caller.user_id(), rows, "Charge update");
        require_affected(rows, "charge", id)
    }

    pub async fn delete(&self, caller: &Caller, id: i64) -> Result<u64> {
        let rows = self.store.delete_owned(caller.user_id(), id).await?;
        debug!(charge_id = id, user_id = caller.user_id(), rows, "Charge delete");
        require_affected(rows, "charge", id)
    }
}

/// Share operations. Either party may view or end a share; only the grantor
/// creates one.
#[derive(Clone)]
pub struct ShareRepository {
    shares: Arc<dyn ShareStore>,
    users: Arc<dyn UserStore>,
}

impl ShareRepository {
    pub fn new(shares: Arc<dyn ShareStore>, users: Arc<dyn UserStore>) -> Self {
        Self { shares, users }
    }

    pub async fn list(&self, caller: &Caller) -> Result<Vec<Share>> {
        let shares = self.shares.list_involving(caller.user_id()).await?;
        Ok(shares
            .into_iter()
            .filter(|s| scope::share_party(caller, s).is_allowed())
            .collect())
    }

    /// Grant `access` from the caller to the user named `recipient`.
    pub async fn create(
        &self,
        caller: &Caller,
        recipient: &str,
        access: AccessLevel,
    ) -> Result<Share> {
        let recipient = self
            .users
            .find_by_username(recipient)
            .await?
            .ok_or_else(|| Error::NotFound("No user found with that username".into()))?;

        let share = self
            .shares
            .insert(caller.user_id(), recipient.identity.id, access)
            .await?;
        info!(
            share_id = share.id,
            grantor = share.grantor_id,
            recipient = share.recipient_id,
            access = %share.access,
            "Share created"
        );
        Ok(share)
    }

    pub async fn delete(&self, caller: &Caller, id: i64) -> Result<u64> {
        let rows = self.shares.delete_involving(caller.user_id(), id).await?;
        debug!(share_id = id, user_id = caller.user_id(), rows, "Share delete");
        require_affected(rows, "share", id)
    }
}

/// All caller-scoped repositories.
#[derive(Clone)]
pub struct Repositories {
    pub budgets: BudgetRepository,
    pub charges: ChargeRepository,
    pub shares: ShareRepository,
}

impl Repositories {
    pub fn new(stores: &Stores) -> Self {
        Self {
            budgets: BudgetRepository::new(stores.budgets.clone()),
            charges: ChargeRepository::new(stores.charges.clone()),
            shares: ShareRepository::new(stores.shares.clone(), stores.users.clone()),
        }
    }
}
