use thiserror::Error;

use crate::host::AUTHORIZATION_MARKER;

pub const DEPLOYMENT_HINT: &str = "There may be a problem with the deployment of Azure Functions App, please deploy Azure Functions (Run command palette \"Microsoft 365 Agents: Deploy\") first before running this App";

pub const NETWORK_ERROR_PREFIX: &str = "Cannot call Azure Functions due to network error, please check your network connection status and ";

pub const LOCAL_RUN_HINT: &str = "make sure to start Azure Functions locally (Run \"npm run start\" command inside api folder from terminal) first before running this App";

pub const PROVISION_DEPLOY_HINT: &str = "make sure to provision and deploy Azure Functions (Run command palette \"Microsoft 365 Agents: Provision\" and \"Microsoft 365 Agents: Deploy\") first before running this App";

/// Raw outcome of a failed request, before classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFailure {
    /// Request URL
    pub url: String,
    /// HTTP status, when a response arrived
    pub status: Option<u16>,
    /// No response at all (connect, DNS, timeout)
    pub network: bool,
    pub message: String,
    /// `error` field of a JSON error body
    pub server_error: Option<String>,
}

/// Remote-call failures, displayed as the user-facing message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FunctionCallError {
    #[error("Host identity provider is not initialized.")]
    NotInitialized,

    /// The function app answered 404
    #[error("{}", DEPLOYMENT_HINT)]
    DeploymentMissing,

    #[error("{}{}", NETWORK_ERROR_PREFIX, network_hint(.local))]
    NetworkUnreachable { local: bool },

    /// Token or consent failure from the identity provider
    #[error("{0}")]
    Identity(String),

    #[error("{}", with_detail(.message, .detail))]
    Generic {
        message: String,
        detail: Option<String>,
    },
}

fn network_hint(local: &bool) -> &'static str {
    if *local {
        LOCAL_RUN_HINT
    } else {
        PROVISION_DEPLOY_HINT
    }
}

fn with_detail(message: &str, detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!("{}: {}", message, detail),
        None => message.to_string(),
    }
}

impl FunctionCallError {
    /// Whether the next reload should run the consent step first
    pub fn needs_consent(&self) -> bool {
        self.to_string().contains(AUTHORIZATION_MARKER)
    }
}

/// Map a transport failure to the message shown to the user
pub fn classify(failure: &CallFailure) -> FunctionCallError {
    if failure.status == Some(404) {
        return FunctionCallError::DeploymentMissing;
    }

    if failure.network {
        return FunctionCallError::NetworkUnreachable {
            local: failure.url.contains("localhost"),
        };
    }

    FunctionCallError::Generic {
        message: failure.message.clone(),
        detail: failure.server_error.clone(),
    }
}
