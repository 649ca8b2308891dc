//! withdrawal_ledger - account ledger service
//!
//! Withdrawals are applied atomically per account; successful ones are
//! published to a pub/sub topic in batches, off the request path.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware, Router};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use withdrawal_ledger::api::{self, AppState};
use withdrawal_ledger::config::{StoreBackend, TransportKind};
use withdrawal_ledger::db;
use withdrawal_ledger::ledger::{AccountStore, InMemoryAccountStore, Ledger, PgAccountStore};
use withdrawal_ledger::publish::{
    BatchPublisher, BatchQueue, BatchState, HttpTopicTransport, InMemoryTransport, TopicTransport,
};
use withdrawal_ledger::{Config, WithdrawalHandler};

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "withdrawal_ledger=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the application router
fn build_router(state: AppState) -> Router {
    let bank_routes = api::create_router().layer(middleware::from_fn(
        api::middleware::logging_middleware,
    ));

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/bank", bank_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

async fn build_store(config: &Config) -> anyhow::Result<(Arc<dyn AccountStore>, Option<PgPool>)> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory account store; balances are lost on restart");
            let store: Arc<dyn AccountStore> = Arc::new(InMemoryAccountStore::new());
            Ok((store, None))
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for postgres"))?;

            tracing::info!("Connecting to database...");
            let pool = db::connect(url, config.database_max_connections).await?;
            db::verify_connection(&pool).await?;
            db::ensure_schema(&pool).await?;
            if !db::check_schema(&pool).await? {
                return Err(anyhow::anyhow!("Database schema incomplete"));
            }
            tracing::info!("Database connected successfully");

            let store: Arc<dyn AccountStore> = Arc::new(PgAccountStore::new(pool.clone()));
            Ok((store, Some(pool)))
        }
    }
}

fn build_transport(config: &Config) -> anyhow::Result<Arc<dyn TopicTransport>> {
    match config.transport {
        TransportKind::Fake => {
            tracing::info!("Using in-memory topic transport");
            Ok(Arc::new(InMemoryTransport::new()))
        }
        TransportKind::Http => {
            let endpoint = config
                .topic_endpoint
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("TOPIC_ENDPOINT is required for http"))?;
            tracing::info!(endpoint = %endpoint, "Using HTTP topic transport");
            Ok(Arc::new(HttpTopicTransport::new(
                endpoint,
                config.publish_timeout,
            )?))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!(environment = %config.environment, "Starting withdrawal_ledger server");

    let (store, pool) = build_store(&config).await?;
    let transport = build_transport(&config)?;

    let queue = Arc::new(BatchQueue::new(config.queue_capacity));
    let publisher = BatchPublisher::new(queue, transport, config.topic.clone(), config.batch_size)?;
    tracing::info!(
        topic = %config.topic,
        batch_size = config.batch_size,
        queue_capacity = config.queue_capacity,
        "Withdrawal publisher ready"
    );

    let handler = Arc::new(WithdrawalHandler::new(Ledger::new(store), Arc::new(publisher)));
    let app = build_router(AppState::new(handler.clone()));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutting down...");

    // Ship the last partial batch and wait for sends still in flight
    let states = handler.shutdown().await;
    let failed = states.iter().filter(|s| **s == BatchState::Failed).count();
    tracing::info!(batches = states.len(), failed, "Publish queue drained");

    if let Some(pool) = pool {
        pool.close().await;
        tracing::info!("Database connections closed");
    }
    tracing::info!("Goodbye!");

    Ok(())
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
