//! HTTP request handlers
//!
//! Each route delegates to the LoopController held in `ServerState`.

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{debug, info};
use serde::de::DeserializeOwned;

use crate::controller::ManualOutcome;
use crate::error::HandsfreeError;
use crate::recognition::RecognitionKind;

use super::ServerState;
use super::messages::{
    CommandsResponse, ExecuteRequest, ExecuteResponse, HealthResponse, HistoryQuery, HistoryResponse, ToggleRequest,
    VisualToggleResponse, VoiceToggleResponse,
};

/// Parse an optional JSON body. An empty body yields the defaults.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, Response> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| bad_request(format!("Invalid JSON body: {}", e)))
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ExecuteResponse::failed(message))).into_response()
}

/// Handle GET /health
pub async fn handle_health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let status = state.controller.status();
    Json(HealthResponse {
        serving: true,
        voice_enabled: status.voice_enabled,
        visual_enabled: status.visual_enabled,
    })
}

/// Handle POST /toggle-voice
pub async fn handle_toggle_voice(State(state): State<ServerState>, body: Bytes) -> Response {
    let req: ToggleRequest = match parse_body(&body) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    let changed = state.controller.set_enabled(RecognitionKind::Voice, req.enabled).await;
    info!("toggle-voice enabled={} changed={}", req.enabled, changed);
    Json(VoiceToggleResponse {
        changed,
        voice_enabled: state.controller.is_enabled(RecognitionKind::Voice),
    })
    .into_response()
}

/// Handle POST /toggle-visual
pub async fn handle_toggle_visual(State(state): State<ServerState>, body: Bytes) -> Response {
    let req: ToggleRequest = match parse_body(&body) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    let changed = state.controller.set_enabled(RecognitionKind::Visual, req.enabled).await;
    info!("toggle-visual enabled={} changed={}", req.enabled, changed);
    Json(VisualToggleResponse {
        changed,
        visual_enabled: state.controller.is_enabled(RecognitionKind::Visual),
    })
    .into_response()
}

/// Handle POST /execute-command
pub async fn handle_execute_command(State(state): State<ServerState>, body: Bytes) -> Response {
    let req: ExecuteRequest = match parse_body(&body) {
        Ok(req) => req,
        Err(resp) => return resp,
    };

    match state.controller.execute_manual(&req.command).await {
        ManualOutcome::Executed { command } => (StatusCode::OK, Json(ExecuteResponse::ok(format!("Executed: {}", command)))),
        ManualOutcome::Unknown { command } => (
            StatusCode::BAD_REQUEST,
            Json(ExecuteResponse::failed(HandsfreeError::UnknownCommand(command).to_string())),
        ),
        ManualOutcome::Failed { message, .. } => (StatusCode::INTERNAL_SERVER_ERROR, Json(ExecuteResponse::failed(message))),
    }
    .into_response()
}

/// Handle GET /command-history?limit=N
///
/// A `limit` that isn't a non-negative integer falls back to the default.
pub async fn handle_command_history(
    State(state): State<ServerState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Json<HistoryResponse> {
    let limit = history_limit(query, state.default_limit);
    let history = state.controller.history(limit).await;
    debug!("command-history limit={} returned={}", limit, history.len());
    Json(HistoryResponse { history })
}

fn history_limit(query: Result<Query<HistoryQuery>, QueryRejection>, default_limit: usize) -> usize {
    match query {
        Ok(Query(query)) => query.limit.unwrap_or(default_limit),
        Err(rejection) => {
            debug!("command-history query ignored: {}", rejection);
            default_limit
        }
    }
}

/// Handle GET /available-commands
pub async fn handle_available_commands(State(state): State<ServerState>) -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: state.controller.available_commands(),
    })
}
