//! HTTP server for the Barnabas chat API.
//!
//! Provides REST endpoints for:
//! - Persona catalog
//! - Session lifecycle (create, switch persona, reset, delete)
//! - Message turns with usage estimates
//! - Transcript export
//!
//! Static files for the single-page form are served as a fallback.

pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use chrono::Utc;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::chat::core::config::ServerConfig;

/// Start the HTTP server.
///
/// # Errors
/// Returns an error if the server fails to start.
pub async fn run_server(
    state: Arc<AppState>,
    config: &ServerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    run_server_with_shutdown(state, config, std::future::pending()).await
}

/// Start the HTTP server with graceful shutdown support.
///
/// The server will stop accepting new connections when `shutdown_signal` completes.
///
/// # Errors
/// Returns an error if the server fails to start.
pub async fn run_server_with_shutdown<F>(
    state: Arc<AppState>,
    config: &ServerConfig,
    shutdown_signal: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let sweeper = spawn_session_sweeper(Arc::clone(&state), config);

    let app: Router = create_router(state, &config.static_dir)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(
        static_dir = %config.static_dir.display(),
        "Barnabas chat server listening on http://{}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await;
    sweeper.abort();
    served?;

    Ok(())
}

/// Periodically drop sessions idle for longer than the configured TTL.
fn spawn_session_sweeper(state: Arc<AppState>, config: &ServerConfig) -> JoinHandle<()> {
    let ttl = config.session_ttl();
    let mut ticker = tokio::time::interval(config.sweep_interval());
    tokio::spawn(async move {
        loop {
            ticker.tick().await;
            state.sweep_idle(ttl, Utc::now());
        }
    })
}
