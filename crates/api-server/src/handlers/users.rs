//! User management handlers for admin operations.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use ledger_core::types::{Role, UserIdentity};
use ledger_core::Caller;

use super::{parse_id, MessageResponse};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// User as returned by the API. Secrets are never included.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    /// `admin` or `standard`.
    pub role: String,
}

impl From<UserIdentity> for UserResponse {
    fn from(user: UserIdentity) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role.to_string(),
        }
    }
}

/// Create user request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    /// `admin` or `standard` (`user` is accepted as `standard`).
    #[serde(default, alias = "permissions")]
    pub role: Option<String>,
}

/// Update user request. Omitting `password` keeps the current one.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, alias = "permissions")]
    pub role: Option<String>,
}

fn parse_role(role: Option<&str>) -> Result<Role, ApiError> {
    match role {
        None => Ok(Role::Standard),
        Some(r) => r.parse().map_err(|e: String| ApiError::BadRequest(e)),
    }
}

fn require_text(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// List all users (admin only).
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "List of all users", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin role required"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = state.credentials.list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Create a new user (admin only).
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin role required"),
        (status = 409, description = "Username already exists"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let Json(req) = payload?;
    require_text(&req.username, "username")?;
    require_text(&req.password, "password")?;
    let role = parse_role(req.role.as_deref())?;

    let user = state
        .credentials
        .create(&req.username, &req.password, role)
        .await?;

    tracing::info!(admin_id = caller.user_id(), user_id = user.id, "Admin created user");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Update a user's name, role and optionally password (admin only).
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = MessageResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin role required"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Username already exists"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&id, "user")?;
    let Json(req) = payload?;
    require_text(&req.username, "username")?;
    let password = req.password.as_deref().filter(|p| !p.is_empty());
    let role = parse_role(req.role.as_deref())?;

    state
        .credentials
        .update(id, &req.username, password, role)
        .await?;

    Ok(Json(MessageResponse::new("User updated successfully")))
}

/// Delete a user and everything they own (admin only).
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 400, description = "Invalid user ID"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin role required"),
        (status = 404, description = "User not found"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&id, "user")?;
    state.credentials.delete(id).await?;

    tracing::info!(admin_id = caller.user_id(), user_id = id, "Admin deleted user");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
