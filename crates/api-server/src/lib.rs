//! API Server
//!
//! HTTP front end for the budgeting service.
//!
//! # Features
//!
//! - **REST API**: budgets, charges and shares scoped to the signed-in user
//! - **Administration**: user management behind a per-request role check
//! - **OpenAPI**: Auto-generated Swagger documentation
//! - **Authentication**: Bearer JWT issued by `/api/login`
//!
//! # Example
//!
//! ```ignore
//! use api_server::{ApiServer, ServerConfig};
//!
//! let config = ServerConfig::from_env()?;
//! let server = ApiServer::new(config, pool)?;
//! server.run().await?;
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method, Request};
use sqlx::PgPool;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::{info, warn, Level};

use auth::credentials::DEMO_USERS;
use auth::jwt::{JwtAuth, JwtConfig};
use auth::{HashingConfig, SecretHasher};
use ledger_core::db::Stores;

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Enable CORS for all origins.
    pub cors_permissive: bool,
    /// Origins allowed when `cors_permissive` is off.
    pub cors_origins: Vec<String>,
    /// Signing secret for session tokens.
    pub jwt_secret: String,
    /// Directory served for paths no API route matches.
    pub static_dir: Option<PathBuf>,
    /// Create the demo users on startup.
    pub seed_demo_users: bool,
    /// Secret hashing cost.
    pub hashing: HashingConfig,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("cors_permissive", &self.cors_permissive)
            .field("cors_origins", &self.cors_origins)
            .field("jwt_secret", &"<redacted>")
            .field("static_dir", &self.static_dir)
            .field("seed_demo_users", &self.seed_demo_users)
            .field("hashing", &self.hashing)
            .finish()
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

impl ServerConfig {
    /// Create from environment variables. Fails if `JWT_SECRET` is unset or empty.
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .context("JWT_SECRET must be set")?;

        Ok(Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            // PORT first (PaaS convention), then API_PORT
            port: std::env::var("PORT")
                .or_else(|_| std::env::var("API_PORT"))
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            cors_permissive: env_flag("CORS_PERMISSIVE", true),
            cors_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            jwt_secret,
            static_dir: std::env::var("STATIC_DIR").ok().map(PathBuf::from),
            seed_demo_users: env_flag("SEED_DEMO_USERS", false),
            hashing: HashingConfig::from_env(),
        })
    }

    /// Build the CORS layer. Without the permissive flag only the listed
    /// origins may make cross-origin calls; an empty list allows none.
    pub fn cors_layer(&self) -> anyhow::Result<CorsLayer> {
        if self.cors_permissive {
            return Ok(CorsLayer::permissive());
        }

        let origins = self
            .cors_origins
            .iter()
            .map(|o| {
                HeaderValue::from_str(o).with_context(|| format!("Invalid CORS origin {:?}", o))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
    }

    /// Get the socket address.
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid socket address {}:{}", self.host, self.port))
    }
}

/// The API server.
pub struct ApiServer {
    config: ServerConfig,
    state: AppState,
    pool: PgPool,
}

impl ApiServer {
    /// Create a new API server over a PostgreSQL pool.
    pub fn new(config: ServerConfig, pool: PgPool) -> anyhow::Result<Self> {
        // Surface a bad origin list before binding anything.
        config.cors_layer()?;
        let hasher = SecretHasher::new(config.hashing).context("Invalid hashing parameters")?;
        let jwt_auth = Arc::new(JwtAuth::new(JwtConfig::new(config.jwt_secret.clone())));
        let state = AppState::new(Stores::postgres(pool.clone()), jwt_auth, hasher);

        Ok(Self {
            config,
            state,
            pool,
        })
    }

    /// Prepare accounts, then serve until Ctrl-C or SIGTERM. The pool is
    /// closed after in-flight requests finish.
    pub async fn run(self) -> anyhow::Result<()> {
        if self.state.credentials.bootstrap_admin().await?.is_none() {
            if self.state.credentials.has_admin().await? {
                info!("Admin account present");
            } else {
                warn!("Starting without any admin account; user management is unreachable");
            }
        }
        if self.config.seed_demo_users {
            let created = self.state.credentials.seed_users(DEMO_USERS).await?;
            info!(created, "Demo user seeding finished");
        }

        let state = Arc::new(self.state);
        let mut router = create_router(state);

        if let Some(ref dir) = self.config.static_dir {
            info!(dir = %dir.display(), "Serving static files");
            router = router.fallback_service(ServeDir::new(dir));
        }

        let router = router
            .layer(
                TraceLayer::new_for_http()
                    .on_request(|request: &Request<_>, _span: &tracing::Span| {
                        tracing::info!(
                            method = %request.method(),
                            uri = %request.uri(),
                            "Incoming request"
                        );
                    })
                    .on_response(DefaultOnResponse::new().level(Level::DEBUG))
                    .on_failure(
                        |error: tower_http::classify::ServerErrorsFailureClass,
                         latency: std::time::Duration,
                         _span: &tracing::Span| {
                            tracing::error!(
                                error = %error,
                                latency_ms = latency.as_millis(),
                                "Request failed"
                            );
                        },
                    ),
            )
            .layer(CompressionLayer::new())
            .layer(DefaultBodyLimit::max(1024 * 1024))
            .layer(self.config.cors_layer()?);

        let addr = self.config.socket_addr()?;
        info!(address = %addr, "Starting API server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped, closing database pool");
        self.pool.close().await;
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::Router;
    use tower::ServiceExt;

    fn config() -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_permissive: true,
            cors_origins: Vec::new(),
            jwt_secret: "test-secret-key-12345".to_string(),
            static_dir: None,
            seed_demo_users: false,
            hashing: HashingConfig::minimal(),
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = config().socket_addr().unwrap();
        assert_eq!(addr.port(), 8080);

        let mut bad = config();
        bad.host = "not a host".to_string();
        assert!(bad.socket_addr().is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let printed = format!("{:?}", config());
        assert!(!printed.contains("test-secret-key-12345"));
    }

    fn cors_router(config: &ServerConfig) -> Router {
        let hasher = SecretHasher::new(HashingConfig::minimal()).unwrap();
        let state = AppState::in_memory("test-secret-key-12345", hasher);
        create_router(Arc::new(state)).layer(config.cors_layer().unwrap())
    }

    async fn allowed_origin(router: &Router, origin: &str) -> Option<String> {
        let request = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, origin)
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_permissive_cors_allows_any_origin() {
        let router = cors_router(&config());
        assert_eq!(
            allowed_origin(&router, "https://elsewhere.test").await.as_deref(),
            Some("*")
        );
    }

    #[tokio::test]
    async fn test_restricted_cors_only_echoes_listed_origins() {
        let mut restricted = config();
        restricted.cors_permissive = false;
        restricted.cors_origins = vec!["https://app.budgify.test".to_string()];
        let router = cors_router(&restricted);

        assert_eq!(
            allowed_origin(&router, "https://app.budgify.test").await.as_deref(),
            Some("https://app.budgify.test")
        );
        assert_eq!(allowed_origin(&router, "https://elsewhere.test").await, None);
    }

    #[test]
    fn test_invalid_cors_origin_rejected() {
        let mut bad = config();
        bad.cors_permissive = false;
        bad.cors_origins = vec!["bad\norigin".to_string()];
        assert!(bad.cors_layer().is_err());
    }
}
