//! API route definitions.

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{self, auth, budgets, charges, health, shares, users};
use crate::middleware::{require_admin, require_auth};
use crate::state::AppState;

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Budgify API",
        version = "1.0.0",
        description = "Personal budgets, charges and shares, scoped to the signed-in user"
    ),
    paths(
        health::health_check,
        health::readiness,
        auth::login,
        auth::me,
        users::list_users,
        users::create_user,
        users::update_user,
        users::delete_user,
        budgets::list_budgets,
        budgets::create_budget,
        budgets::update_budget,
        budgets::delete_budget,
        charges::list_charges,
        charges::create_charge,
        charges::update_charge,
        charges::delete_charge,
        shares::list_shares,
        shares::create_share,
        shares::delete_share,
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            handlers::MessageResponse,
            health::HealthResponse,
            auth::LoginRequest,
            auth::LoginResponse,
            users::UserResponse,
            users::CreateUserRequest,
            users::UpdateUserRequest,
            budgets::BudgetRequest,
            budgets::BudgetResponse,
            charges::ChargeRequest,
            charges::ChargeResponse,
            shares::CreateShareRequest,
            shares::ShareResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Login and session"),
        (name = "users", description = "User administration (admin only)"),
        (name = "budgets", description = "Caller's budgets"),
        (name = "charges", description = "Caller's charges"),
        (name = "shares", description = "Shares between users"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the main router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness))
        .route("/api/login", post(auth::login));

    let authenticated = Router::new()
        .route("/api/me", get(auth::me))
        .route(
            "/api/budgets",
            get(budgets::list_budgets).post(budgets::create_budget),
        )
        .route(
            "/api/budgets/{id}",
            put(budgets::update_budget).delete(budgets::delete_budget),
        )
        .route(
            "/api/charges",
            get(charges::list_charges).post(charges::create_charge),
        )
        .route(
            "/api/charges/{id}",
            put(charges::update_charge).delete(charges::delete_charge),
        )
        .route(
            "/api/shares",
            get(shares::list_shares).post(shares::create_share),
        )
        .route("/api/shares/{id}", axum::routing::delete(shares::delete_share))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    // Layers run bottom-up: authenticate first, then check the stored role.
    let admin = Router::new()
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route(
            "/api/users/{id}",
            put(users::update_user).delete(users::delete_user),
        )
        .route_layer(from_fn_with_state(state.clone(), require_admin))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public)
        .merge(authenticated)
        .merge(admin)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
}
