//! Authentication middleware for API routes.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use ledger_core::Caller;

use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;

/// Validate the bearer token and inject the verified [`Caller`] into
/// request extensions for handlers.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let header = match request.headers().get(AUTHORIZATION) {
        Some(value) => match value.to_str() {
            Ok(s) => Some(s),
            Err(_) => return unauthorized_response("Invalid authorization header encoding"),
        },
        None => None,
    };

    let caller = match state.access.authenticate(header) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(error = %e, "Authentication failed");
            return ApiError::from(e).into_response();
        }
    };

    tracing::debug!(user_id = caller.user_id(), "Authenticated request");
    request.extensions_mut().insert(caller);

    next.run(request).await
}

/// Require the caller's current stored role to be admin.
/// Must be applied AFTER `require_auth` middleware.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let caller = match request.extensions().get::<Caller>() {
        Some(c) => *c,
        None => return unauthorized_response("Not authenticated"),
    };

    match state.access.is_admin(&caller).await {
        Ok(true) => next.run(request).await,
        Ok(false) => {
            tracing::debug!(user_id = caller.user_id(), "Admin route denied");
            forbidden_response("Admin role required")
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Helper to create an unauthorized (401) response.
fn unauthorized_response(message: &str) -> Response {
    let body = ErrorResponse::new("UNAUTHORIZED", message);
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

/// Helper to create a forbidden (403) response.
fn forbidden_response(message: &str) -> Response {
    let body = ErrorResponse::new("FORBIDDEN", message);
    (StatusCode::FORBIDDEN, Json(body)).into_response()
}
