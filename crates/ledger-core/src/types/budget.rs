//! Budget types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{validate_amount, validate_name, validate_period, UserId};
use crate::Result;

/// A spending budget owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Budget {
    pub id: i64,
    pub name: String,
    pub amount: Decimal,
    pub category: Option<String>,
    pub period: Option<String>,
    pub user_id: UserId,
}

/// Caller-editable budget attributes. There is no owner field: the owner is
/// always the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetFields {
    pub name: String,
    pub amount: Decimal,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
}

impl BudgetFields {
    /// Validate and normalize the fields for persistence.
    pub fn validated(&self) -> Result<Self> {
        Ok(Self {
            name: validate_name(&self.name)?,
            amount: validate_amount(self.amount)?,
            category: self
                .category
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            period: validate_period(self.period.as_deref())?,
        })
    }
}
