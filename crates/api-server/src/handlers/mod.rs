//! API request handlers.

pub mod auth;
pub mod budgets;
pub mod charges;
pub mod health;
pub mod shares;
pub mod users;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;

/// Plain acknowledgement for updates and deletes.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Parse a numeric path id. Anything else is a bad request, not a 404.
pub(crate) fn parse_id(raw: &str, kind: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid {} ID", kind)))
}
