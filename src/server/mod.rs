use crate::config::Config;
use crate::delivery::DeliveryService;
use anyhow::{Context, Result};
use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use clipvault_db::pool::DbPool;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;

pub mod cors;
pub mod error;
pub mod routes_stream;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub delivery: Arc<DeliveryService>,
}

impl AppContext {
    pub fn new(config: Config, pool: DbPool) -> Self {
        let delivery = DeliveryService::from_config(&config, pool);
        Self {
            config: Arc::new(config),
            delivery: Arc::new(delivery),
        }
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/s/{slug}", get(routes_stream::short_link))
        .route("/videos/{video_id}/stream", get(routes_stream::stream_video));

    if ctx.config.server.diagnostics {
        app = app.route("/videos/{video_id}/locate", get(routes_stream::locate_video));
        tracing::info!("Diagnostics endpoint enabled");
    }

    cors::apply(app)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Start the HTTP server
pub async fn start_server(config: Config, pool: DbPool) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let ctx = AppContext::new(config, pool);
    tracing::info!(
        strategies = ?ctx.delivery.locator().strategy_names(),
        "Storage strategy chain"
    );

    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received");
}
