//! Charge handlers. Every operation is scoped to the authenticated caller.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use ledger_core::types::{Charge, ChargeFields};
use ledger_core::Caller;

use super::{parse_id, MessageResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Charge response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChargeResponse {
    pub id: i64,
    pub name: String,
    #[schema(value_type = String, example = "4.50")]
    pub amount: Decimal,
    pub category: String,
    /// Recurrence descriptor, if the charge repeats.
    pub periodical: Option<String>,
    pub user_id: i64,
    /// Assigned by the server on creation.
    pub created_at: DateTime<Utc>,
}

impl From<Charge> for ChargeResponse {
    fn from(c: Charge) -> Self {
        Self {
            id: c.id,
            name: c.name,
            amount: c.amount,
            category: c.category,
            periodical: c.periodical,
            user_id: c.user_id,
            created_at: c.created_at,
        }
    }
}

/// Create or replace charge request. Owner and timestamp fields are ignored.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChargeRequest {
    pub name: String,
    #[schema(value_type = String, example = "4.50")]
    pub amount: Decimal,
    pub category: String,
    #[serde(default)]
    pub periodical: Option<String>,
}

impl From<ChargeRequest> for ChargeFields {
    fn from(req: ChargeRequest) -> Self {
        Self {
            name: req.name,
            amount: req.amount,
            category: req.category,
            periodical: req.periodical,
        }
    }
}

/// List the caller's charges.
#[utoipa::path(
    get,
    path = "/api/charges",
    responses(
        (status = 200, description = "Caller's charges", body = Vec<ChargeResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "charges"
)]
pub async fn list_charges(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<Vec<ChargeResponse>>> {
    let charges = state.repos.charges.list(&caller).await?;
    Ok(Json(charges.into_iter().map(ChargeResponse::from).collect()))
}

/// Record a charge owned by the caller.
#[utoipa::path(
    post,
    path = "/api/charges",
    request_body = ChargeRequest,
    responses(
        (status = 201, description = "Charge created", body = ChargeResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "charges"
)]
pub async fn create_charge(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<ChargeRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ChargeResponse>)> {
    let Json(req) = payload?;
    let charge = state.repos.charges.create(&caller, &req.into()).await?;
    Ok((StatusCode::CREATED, Json(charge.into())))
}

/// Replace one of the caller's charges. `created_at` is preserved.
#[utoipa::path(
    put,
    path = "/api/charges/{id}",
    params(("id" = i64, Path, description = "Charge ID")),
    request_body = ChargeRequest,
    responses(
        (status = 200, description = "Charge updated", body = MessageResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Charge not found"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "charges"
)]
pub async fn update_charge(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    payload: Result<Json<ChargeRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&id, "charge")?;
    let Json(req) = payload?;
    state.repos.charges.update(&caller, id, &req.into()).await?;
    Ok(Json(MessageResponse::new("Charge updated successfully")))
}

/// Delete one of the caller's charges.
#[utoipa::path(
    delete,
    path = "/api/charges/{id}",
    params(("id" = i64, Path, description = "Charge ID")),
    responses(
        (status = 200, description = "Charge deleted", body = MessageResponse),
        (status = 400, description = "Invalid charge ID"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Charge not found"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "charges"
)]
pub async fn delete_charge(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&id, "charge")?;
    state.repos.charges.delete(&caller, id).await?;
    Ok(Json(MessageResponse::new("Charge deleted successfully")))
}
