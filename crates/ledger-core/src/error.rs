//! Error types for the ledger store layer.

use thiserror::Error;

/// PostgreSQL SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL SQLSTATE for `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Client-facing text for a taken username. `users.username` is the only
/// unique column, and constraint names stay out of responses.
pub const USERNAME_TAKEN: &str = "username already exists";

#[derive(Error, Debug)]
pub enum Error {
    /// Row absent, not owned by the caller, or not shared with the caller.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    /// Whether the error is a store/infrastructure failure rather than a caller mistake.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Error::Database(_) | Error::Migration(_) | Error::Config { .. }
        )
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    tracing::debug!(constraint = ?db_err.constraint(), "Unique violation");
                    return Error::Conflict(USERNAME_TAKEN.to_string());
                }
                Some(FOREIGN_KEY_VIOLATION) => {
                    return Error::NotFound("referenced user no longer exists".to_string());
                }
                _ => {}
            }
        }
        Error::Database(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
