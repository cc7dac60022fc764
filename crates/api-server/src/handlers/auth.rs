//! Login and session handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Extension;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use ledger_core::Caller;

use super::users::UserResponse;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// User login request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Username (case-sensitive).
    pub username: String,
    /// Password.
    pub password: String,
}

/// Login response with token and the user's role.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    /// JWT access token, valid for 24 hours.
    pub token: String,
    /// Role at login time. Admin routes re-check the stored role.
    pub permissions: String,
}

/// Login with username and password.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid request payload"),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(req) = payload?;

    let user = state
        .credentials
        .verify(&req.username, &req.password)
        .await
        .inspect_err(|e| tracing::info!(error = %e, "Login failed"))?;

    let token = state
        .jwt_auth
        .create_token(user.id)
        .map_err(|e| ApiError::Internal(format!("Token generation failed: {}", e)))?;

    tracing::info!(user_id = user.id, "Login succeeded");

    Ok(Json(LoginResponse {
        message: "login successful".to_string(),
        token,
        permissions: user.role.to_string(),
    }))
}

/// Current user's identity.
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Authenticated user", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User no longer exists"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "auth"
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<UserResponse>> {
    let user = state.credentials.lookup(caller.user_id()).await?;
    Ok(Json(user.into()))
}
