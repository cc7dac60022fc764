//! Budgify: personal budgeting API
//!
//! This is the root crate that provides test and benchmark access to the
//! workspace crates. For actual functionality, use the individual crates:
//!
//! - `ledger-core`: data model, ownership predicates, stores, scoped repositories
//! - `auth`: session tokens, secret hashing, credential store, access checks
//! - `api-server`: REST API server

pub use api_server as server;
pub use auth;
pub use ledger_core as core;
