//! API Server binary entrypoint.

use anyhow::Context;
use api_server::{ApiServer, ServerConfig};
use ledger_core::config::DatabaseConfig;
use ledger_core::db;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    // Fail before touching the database if the signing secret is missing
    let config = ServerConfig::from_env()?;
    let db_config = DatabaseConfig::from_env();

    let pool = db::create_pool(&db_config)
        .await
        .context("Failed to connect to database")?;

    if !db_config.skip_migrations {
        tracing::info!("Running database migrations...");
        db::run_migrations(&pool).await?;
    } else {
        tracing::info!("Skipping migrations (SKIP_MIGRATIONS=true)");
    }

    let server = ApiServer::new(config, pool)?;
    server.run().await?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "api_server=debug,auth=info,ledger_core=info,tower_http=debug".into()
    });
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
