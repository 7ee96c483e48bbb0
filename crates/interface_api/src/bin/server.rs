//! Share Ledger - API Server Binary
//!
//! # Usage
//!
//! ```bash
//! # In-memory ledger with default configuration
//! cargo run --bin ledger-api
//!
//! # PostgreSQL-backed ledger
//! LEDGER_DATABASE_URL=postgres://localhost/share_ledger LEDGER_PORT=8080 cargo run --bin ledger-api
//! ```
//!
//! # Environment Variables
//!
//! * `LEDGER_HOST` - Server host (default: 0.0.0.0)
//! * `LEDGER_PORT` - Server port (default: 8080)
//! * `LEDGER_JWT_SECRET` - JWT signing secret (required in production)
//! * `LEDGER_JWT_EXPIRATION_SECS` - JWT token expiration in seconds (default: 3600)
//! * `LEDGER_DATABASE_URL` - PostgreSQL connection string; unset runs in memory
//! * `LEDGER_MAX_DB_CONNECTIONS` - Pool size (default: 10)
//! * `LEDGER_LOG_LEVEL` - Log level or filter directive (default: info)
//! * `LEDGER_LOG_JSON` - Emit JSON log lines (default: false)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::SystemClock;
use domain_investment::{InMemoryLedgerStore, LedgerStore};
use infra_db::{create_pool, run_migrations, DatabaseConfig, PgLedgerStore};
use interface_api::{config::ApiConfig, create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid LEDGER_* configuration")?;

    init_tracing(&config);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting Share Ledger API Server"
    );

    let store = build_store(&config).await?;
    let state = AppState::new(store, Arc::new(SystemClock), config.clone());
    let app = create_router(state);

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid server address {}", config.server_addr()))?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber; `RUST_LOG` overrides the configured level.
fn init_tracing(config: &ApiConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// PostgreSQL when a database URL is configured, otherwise the in-memory store
async fn build_store(config: &ApiConfig) -> anyhow::Result<Arc<dyn LedgerStore>> {
    let Some(url) = config.database_url.as_deref() else {
        tracing::warn!("LEDGER_DATABASE_URL not set, ledger state will not survive a restart");
        return Ok(Arc::new(InMemoryLedgerStore::new()));
    };

    tracing::info!("Connecting to database...");
    let pool = create_pool(DatabaseConfig::new(url).max_connections(config.max_db_connections))
        .await
        .context("database connection failed")?;

    tracing::info!("Running database migrations...");
    run_migrations(&pool).await.context("database migration failed")?;

    tracing::info!("Database ready");
    Ok(Arc::new(PgLedgerStore::new(pool)))
}

/// Waits for Ctrl+C or SIGTERM so in-flight requests can finish.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
