//! Ledger Core Library
//!
//! Data model, ownership predicates, and store access for the budgeting API.
//! Every budget and charge operation here is scoped to a [`scope::Caller`];
//! nothing in this crate looks up a row by id alone.

pub mod config;
pub mod db;
pub mod error;
pub mod repository;
pub mod scope;
pub mod types;

pub use error::{Error, Result};
pub use scope::{Caller, Decision};
