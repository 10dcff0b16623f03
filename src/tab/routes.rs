use super::handlers;
use super::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Tab root
        .route("/tab", get(handlers::get_tab))
        // Audio capture panel
        .route("/tab/capture/toggle", post(handlers::toggle_capture))
        .route("/tab/capture", get(handlers::get_capture))
        .route("/tab/capture/start", post(handlers::start_capture))
        .route("/tab/capture/stop", post(handlers::stop_capture))
        .route("/tab/capture/error", delete(handlers::dismiss_capture_error))
        // Recorded audio
        .route("/artifacts/:id", get(handlers::get_artifact))
        // Function panel
        .route("/tab/function", get(handlers::get_function))
        .route("/tab/function/reload", post(handlers::reload_function))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
