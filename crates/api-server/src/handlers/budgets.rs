//! Budget handlers. Every operation is scoped to the authenticated caller.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use ledger_core::types::{Budget, BudgetFields};
use ledger_core::Caller;

use super::{parse_id, MessageResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Budget response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BudgetResponse {
    pub id: i64,
    pub name: String,
    /// Decimal amount with two fractional digits.
    #[schema(value_type = String, example = "1200.00")]
    pub amount: Decimal,
    pub category: Option<String>,
    /// Recurrence, e.g. `monthly`.
    pub period: Option<String>,
    /// Owner. Always the caller.
    pub user_id: i64,
}

impl From<Budget> for BudgetResponse {
    fn from(b: Budget) -> Self {
        Self {
            id: b.id,
            name: b.name,
            amount: b.amount,
            category: b.category,
            period: b.period,
            user_id: b.user_id,
        }
    }
}

/// Create or replace budget request. Any owner field in the body is ignored.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BudgetRequest {
    pub name: String,
    /// Non-negative amount; numbers and numeric strings are accepted.
    #[schema(value_type = String, example = "1200.00")]
    pub amount: Decimal,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
}

impl From<BudgetRequest> for BudgetFields {
    fn from(req: BudgetRequest) -> Self {
        Self {
            name: req.name,
            amount: req.amount,
            category: req.category,
            period: req.period,
        }
    }
}

/// List the caller's budgets.
#[utoipa::path(
    get,
    path = "/api/budgets",
    responses(
        (status = 200, description = "Caller's budgets", body = Vec<BudgetResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "budgets"
)]
pub async fn list_budgets(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<Vec<BudgetResponse>>> {
    let budgets = state.repos.budgets.list(&caller).await?;
    Ok(Json(budgets.into_iter().map(BudgetResponse::from).collect()))
}

/// Create a budget owned by the caller.
#[utoipa::path(
    post,
    path = "/api/budgets",
    request_body = BudgetRequest,
    responses(
        (status = 201, description = "Budget created", body = BudgetResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "budgets"
)]
pub async fn create_budget(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<BudgetRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<BudgetResponse>)> {
    let Json(req) = payload?;
    let budget = state.repos.budgets.create(&caller, &req.into()).await?;
    Ok((StatusCode::CREATED, Json(budget.into())))
}

/// Replace one of the caller's budgets.
#[utoipa::path(
    put,
    path = "/api/budgets/{id}",
    params(("id" = i64, Path, description = "Budget ID")),
    request_body = BudgetRequest,
    responses(
        (status = 200, description = "Budget updated", body = MessageResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Budget not found"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "budgets"
)]
pub async fn update_budget(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    payload: Result<Json<BudgetRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&id, "budget")?;
    let Json(req) = payload?;
    state.repos.budgets.update(&caller, id, &req.into()).await?;
    Ok(Json(MessageResponse::new("Budget updated successfully")))
}

/// Delete one of the caller's budgets.
#[utoipa::path(
    delete,
    path = "/api/budgets/{id}",
    params(("id" = i64, Path, description = "Budget ID")),
    responses(
        (status = 200, description = "Budget deleted", body = MessageResponse),
        (status = 400, description = "Invalid budget ID"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Budget not found"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "budgets"
)]
pub async fn delete_budget(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&id, "budget")?;
    state.repos.budgets.delete(&caller, id).await?;
    Ok(Json(MessageResponse::new("Budget deleted successfully")))
}
