//! Remote function call panel
//!
//! `FunctionClient` issues the bearer-authenticated GET, `classify` turns
//! transport failures into user-facing hints, and `RemoteCallWidget` holds
//! the loading/success/error state plus the one-shot consent flag.

mod client;
mod error;
mod widget;

pub use client::FunctionClient;
pub use error::{
    classify, CallFailure, FunctionCallError, DEPLOYMENT_HINT, LOCAL_RUN_HINT,
    NETWORK_ERROR_PREFIX, PROVISION_DEPLOY_HINT,
};
pub use widget::{RemoteCallState, RemoteCallView, RemoteCallWidget, CONSENT_SCOPES, DEFAULT_DOCS_URL};
