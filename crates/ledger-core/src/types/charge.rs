//! Charge types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{validate_amount, validate_name, validate_period, UserId};
use crate::{Error, Result};

/// A one-time or recurring charge owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Charge {
    pub id: i64,
    pub name: String,
    pub amount: Decimal,
    pub category: String,
    pub periodical: Option<String>,
    pub user_id: UserId,
    /// Assigned by the store on insert and never updated.
    pub created_at: DateTime<Utc>,
}

/// Caller-editable charge attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeFields {
    pub name: String,
    pub amount: Decimal,
    pub category: String,
    #[serde(default)]
    pub periodical: Option<String>,
}

impl ChargeFields {
    pub fn validated(&self) -> Result<Self> {
        let category = self.category.trim();
        if category.is_empty() {
            return Err(Error::InvalidInput("category must not be empty".into()));
        }
        Ok(Self {
            name: validate_name(&self.name)?,
            amount: validate_amount(self.amount)?,
            category: category.to_string(),
            periodical: validate_period(self.periodical.as_deref())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charge_requires_category() {
        let fields = ChargeFields {
            name: "Netflix".into(),
            amount: Decimal::new(1599, 2),
            category: " ".into(),
            periodical: Some("monthly".into()),
        };
        assert!(matches!(fields.validated(), Err(Error::InvalidInput(_))));
    }
}
