use super::state::AppState;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{info, warn};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub capture_open: bool,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn capture_closed() -> Response {
    error_response(StatusCode::CONFLICT, "Audio capture panel is not open")
}

fn function_disabled() -> Response {
    error_response(StatusCode::NOT_FOUND, "No function is configured for this tab")
}

// ============================================================================
// Tab
// ============================================================================

/// GET /tab
pub async fn get_tab(State(state): State<AppState>) -> impl IntoResponse {
    let tab = state.tab.lock().await;
    Json(tab.view())
}

/// POST /tab/capture/toggle
/// Open or close the audio capture panel
pub async fn toggle_capture(State(state): State<AppState>) -> impl IntoResponse {
    let mut tab = state.tab.lock().await;
    let capture_open = tab.toggle_capture().await;
    info!("Audio capture panel {}", if capture_open { "opened" } else { "closed" });
    Json(ToggleResponse { capture_open })
}

// ============================================================================
// Capture
// ============================================================================

/// GET /tab/capture
pub async fn get_capture(State(state): State<AppState>) -> Response {
    let tab = state.tab.lock().await;
    match tab.capture() {
        Some(capture) => Json(capture.view()).into_response(),
        None => capture_closed(),
    }
}

/// POST /tab/capture/start
pub async fn start_capture(State(state): State<AppState>) -> Response {
    let mut tab = state.tab.lock().await;
    match tab.capture_mut() {
        Some(capture) => {
            capture.start().await;
            Json(capture.view()).into_response()
        }
        None => capture_closed(),
    }
}

/// POST /tab/capture/stop
pub async fn stop_capture(State(state): State<AppState>) -> Response {
    let mut tab = state.tab.lock().await;
    match tab.capture_mut() {
        Some(capture) => {
            capture.stop().await;
            Json(capture.view()).into_response()
        }
        None => capture_closed(),
    }
}

/// DELETE /tab/capture/error
/// Dismiss the inline error message
pub async fn dismiss_capture_error(State(state): State<AppState>) -> Response {
    let mut tab = state.tab.lock().await;
    match tab.capture_mut() {
        Some(capture) => {
            capture.dismiss_error();
            Json(capture.view()).into_response()
        }
        None => capture_closed(),
    }
}

/// GET /artifacts/:id
/// Recorded audio behind a playback URL
pub async fn get_artifact(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.artifacts.get(&id) {
        Some(artifact) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, artifact.mime_type.clone())],
            artifact.bytes.as_ref().clone(),
        )
            .into_response(),
        None => {
            warn!("Artifact {} not found", id);
            error_response(StatusCode::NOT_FOUND, format!("Artifact {} not found", id))
        }
    }
}

// ============================================================================
// Function
// ============================================================================

/// GET /tab/function
pub async fn get_function(State(state): State<AppState>) -> Response {
    let tab = state.tab.lock().await;
    match tab.function() {
        Some(function) => Json(function.view()).into_response(),
        None => function_disabled(),
    }
}

/// POST /tab/function/reload
/// Authorize if needed and call the function
pub async fn reload_function(State(state): State<AppState>) -> Response {
    let mut tab = state.tab.lock().await;
    match tab.function_mut() {
        Some(function) => {
            function.reload().await;
            Json(function.view()).into_response()
        }
        None => function_disabled(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
