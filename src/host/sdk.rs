use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message the identity provider uses when the app lacks consent
pub const AUTHORIZATION_MARKER: &str = "The application may not be authorized.";

/// Host SDK failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("Host SDK is not initialized")]
    NotInitialized,

    #[error("Host SDK initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Host context is unavailable: {0}")]
    ContextUnavailable(String),

    #[error("Permission API is not supported: {0}")]
    PermissionApiUnsupported(String),

    /// Token acquisition needs an interactive consent first
    #[error("{}", AUTHORIZATION_MARKER)]
    ConsentRequired,

    #[error("Failed to acquire access token: {0}")]
    Token(String),

    #[error("Consent was not granted: {0}")]
    ConsentFailed(String),
}

/// App, user and page metadata handed out by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostContext {
    pub session_id: String,
    pub host_name: String,
    /// Host theme: "default", "dark" or "contrast"
    pub theme: String,
    pub locale: String,
    pub user: Option<UserInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: Option<DateTime<Utc>>,
}

/// App context capability of the host SDK
#[async_trait::async_trait]
pub trait HostSdk: Send + Sync {
    /// Initialize the app context; safe to call repeatedly
    async fn initialize(&self) -> Result<(), HostError>;

    async fn get_context(&self) -> Result<HostContext, HostError>;

    /// Whether the host exposes its own media API
    fn media_api_available(&self) -> bool;
}

/// Device permission API
#[async_trait::async_trait]
pub trait PermissionProbe: Send + Sync {
    /// Whether device media and permission queries exist at all
    fn permission_api_available(&self) -> bool;

    async fn query_microphone(&self) -> Result<PermissionState, HostError>;
}

/// Identity capability: tokens and interactive consent
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// An access token for `scopes` (empty for the app's own token)
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken, HostError>;

    /// Interactive consent for `scopes`
    async fn login(&self, scopes: &[&str]) -> Result<(), HostError>;
}
