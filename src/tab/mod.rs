//! Tab surface over HTTP
//!
//! - GET /health - Health check
//! - GET /tab - Theme, welcome info and both panels
//! - POST /tab/capture/toggle - Open/close the capture panel
//! - GET /tab/capture, POST /tab/capture/start, POST /tab/capture/stop
//! - DELETE /tab/capture/error - Dismiss the capture error
//! - GET /artifacts/:id - Recorded audio
//! - GET /tab/function, POST /tab/function/reload - Function panel

mod handlers;
mod panel;
mod routes;
mod state;

pub use panel::{theme_class, Tab, TabView, WelcomeView};
pub use routes::create_router;
pub use state::AppState;
