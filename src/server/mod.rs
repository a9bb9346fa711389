//! HTTP server
//!
//! Exposes the LoopController over JSON routes:
//! - GET  /health
//! - POST /toggle-voice, /toggle-visual
//! - POST /execute-command
//! - GET  /command-history?limit=N
//! - GET  /available-commands

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use log::info;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::controller::LoopController;
use crate::error::Result;

mod context;
pub mod handlers;
pub mod messages;

pub use context::{ServerState, build_controller, build_registry, build_visual_source, build_voice_source};
pub use messages::{
    CommandsResponse, ExecuteRequest, ExecuteResponse, HealthResponse, HistoryQuery, HistoryResponse, ToggleRequest,
    VisualToggleResponse, VoiceToggleResponse,
};

/// Build the route table around shared state.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(handlers::handle_health))
        .route("/toggle-voice", post(handlers::handle_toggle_voice))
        .route("/toggle-visual", post(handlers::handle_toggle_visual))
        .route("/execute-command", post(handlers::handle_execute_command))
        .route("/command-history", get(handlers::handle_command_history))
        .route("/available-commands", get(handlers::handle_available_commands))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until `shutdown` resolves, then stop both loops.
pub async fn serve<F>(listener: TcpListener, state: ServerState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let controller: Arc<LoopController> = state.controller.clone();
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on http://{}", addr);
    }

    let result = axum::serve(listener, router(state)).with_graceful_shutdown(shutdown).await;

    info!("Server stopping, shutting down recognition loops");
    controller.shutdown().await;
    result?;
    Ok(())
}
