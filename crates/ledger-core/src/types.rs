//! Core domain types for the budgeting API.

pub mod budget;
pub mod charge;
pub mod share;
pub mod user;

pub use budget::*;
pub use charge::*;
pub use share::*;
pub use user::*;

use rust_decimal::Decimal;

use crate::{Error, Result};

/// Longest accepted budget/charge name (`VARCHAR(100)`).
pub const MAX_NAME_LEN: usize = 100;
/// Longest accepted recurrence descriptor (`VARCHAR(20)`).
pub const MAX_PERIOD_LEN: usize = 20;
/// Longest accepted username (`VARCHAR(255)`).
pub const MAX_USERNAME_LEN: usize = 255;

/// Amounts are stored as `NUMERIC(10,2)`.
fn max_amount() -> Decimal {
    Decimal::new(100_000_000, 0)
}

pub(crate) fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("name must not be empty".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::InvalidInput(format!(
            "name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

/// Usernames are matched exactly, so they are checked but never trimmed.
pub fn validate_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(Error::InvalidInput("username must not be empty".into()));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(Error::InvalidInput(format!(
            "username must be at most {} characters",
            MAX_USERNAME_LEN
        )));
    }
    Ok(())
}

pub(crate) fn validate_amount(amount: Decimal) -> Result<Decimal> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::InvalidInput("amount must not be negative".into()));
    }
    let amount = amount.round_dp(2);
    if amount >= max_amount() {
        return Err(Error::InvalidInput("amount is too large".into()));
    }
    Ok(amount)
}

pub(crate) fn validate_period(period: Option<&str>) -> Result<Option<String>> {
    match period.map(str::trim) {
        None | Some("") => Ok(None),
        Some(p) if p.chars().count() > MAX_PERIOD_LEN => Err(Error::InvalidInput(format!(
            "period must be at most {} characters",
            MAX_PERIOD_LEN
        ))),
        Some(p) => Ok(Some(p.to_string())),
    }
}
