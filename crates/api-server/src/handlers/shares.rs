//! Share handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use ledger_core::types::{AccessLevel, Share};
use ledger_core::Caller;

use super::{parse_id, MessageResponse};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Share response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShareResponse {
    pub id: i64,
    /// Granting user.
    pub user_id: i64,
    /// Receiving user.
    pub user_share_id: i64,
    /// `read-only` or `read-write`.
    pub access: String,
}

impl From<Share> for ShareResponse {
    fn from(s: Share) -> Self {
        Self {
            id: s.id,
            user_id: s.grantor_id,
            user_share_id: s.recipient_id,
            access: s.access.to_string(),
        }
    }
}

/// Create share request. The caller is always the grantor.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateShareRequest {
    /// Recipient's username.
    #[serde(rename = "shareUsername")]
    pub share_username: String,
    /// `read-only` (default) or `read-write`.
    #[serde(default)]
    pub access: Option<String>,
}

/// List shares where the caller is grantor or recipient.
#[utoipa::path(
    get,
    path = "/api/shares",
    responses(
        (status = 200, description = "Shares involving the caller", body = Vec<ShareResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "shares"
)]
pub async fn list_shares(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<Vec<ShareResponse>>> {
    let shares = state.repos.shares.list(&caller).await?;
    Ok(Json(shares.into_iter().map(ShareResponse::from).collect()))
}

/// Grant another user access.
#[utoipa::path(
    post,
    path = "/api/shares",
    request_body = CreateShareRequest,
    responses(
        (status = 201, description = "Share created", body = ShareResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No user found with that username"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "shares"
)]
pub async fn create_share(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<CreateShareRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ShareResponse>)> {
    let Json(req) = payload?;
    let access = match req.access.as_deref() {
        None => AccessLevel::default(),
        Some(raw) => raw.parse::<AccessLevel>().map_err(ApiError::BadRequest)?,
    };

    let share = state
        .repos
        .shares
        .create(&caller, &req.share_username, access)
        .await?;
    Ok((StatusCode::CREATED, Json(share.into())))
}

/// End a share. Either party may do this.
#[utoipa::path(
    delete,
    path = "/api/shares/{id}",
    params(("id" = i64, Path, description = "Share ID")),
    responses(
        (status = 200, description = "Share deleted", body = MessageResponse),
        (status = 400, description = "Invalid share ID"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Share not found"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "shares"
)]
pub async fn delete_share(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&id, "share")?;
    state.repos.shares.delete(&caller, id).await?;
    Ok(Json(MessageResponse::new("Share deleted successfully")))
}
