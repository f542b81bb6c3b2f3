//! Server startup: client construction, metrics, and the HTTP listener.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::database::SupabaseClient;
use crate::error::Result;
use crate::metrics;
use crate::utils::shutdown_signal;

/// Build the shared state from configuration.
///
/// The client is constructed here, before anything listens.
pub fn build_state(config: &Config) -> Result<AppState> {
    let client = SupabaseClient::new(config)?;
    Ok(AppState::new(Arc::new(client)))
}

/// Run the HTTP server until a shutdown signal arrives.
pub async fn run(config: &Config) -> Result<()> {
    let state = build_state(config)?;

    if config.metrics_enabled {
        metrics::install_exporter(config.metrics_port)?;
    }

    let router = create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("Backend listening on port {}", config.port);

    // In-flight requests are dropped, not drained, on shutdown.
    tokio::select! {
        result = axum::serve(listener, router).into_future() => result?,
        _ = shutdown_signal() => info!("Stopping HTTP server"),
    }

    Ok(())
}
