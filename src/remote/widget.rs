use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::client::FunctionClient;
use super::error::FunctionCallError;
use crate::host::IdentityProvider;
use crate::logger::Logger;

/// Scopes requested by the consent step
pub const CONSENT_SCOPES: &[&str] = &["User.Read"];

pub const DEFAULT_DOCS_URL: &str = "https://aka.ms/teamsfx-azure-functions";

/// Result of the last reload. Exactly one is rendered.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum RemoteCallState {
    Idle,
    Loading,
    Success(Value),
    Error(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoteCallView {
    pub function_name: String,
    pub endpoint: String,
    pub loading: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub needs_consent: bool,
    pub code_path: String,
    pub docs_url: String,
}

/// Calls the companion function on demand with a host-issued token
pub struct RemoteCallWidget {
    identity: Option<Arc<dyn IdentityProvider>>,
    client: FunctionClient,
    logger: Logger,
    needs_consent: bool,
    state: RemoteCallState,
    code_path: String,
    docs_url: String,
}

impl RemoteCallWidget {
    pub fn new(
        identity: Option<Arc<dyn IdentityProvider>>,
        client: FunctionClient,
        logger: Logger,
    ) -> Self {
        let code_path = format!("api/src/functions/{}.ts", client.function_name());
        Self {
            identity,
            client,
            logger,
            needs_consent: false,
            state: RemoteCallState::Idle,
            code_path,
            docs_url: DEFAULT_DOCS_URL.to_string(),
        }
    }

    pub fn state(&self) -> &RemoteCallState {
        &self.state
    }

    pub fn needs_consent(&self) -> bool {
        self.needs_consent
    }

    pub fn view(&self) -> RemoteCallView {
        let (data, error) = match &self.state {
            RemoteCallState::Success(data) => (Some(data.clone()), None),
            RemoteCallState::Error(message) => (None, Some(message.clone())),
            RemoteCallState::Idle | RemoteCallState::Loading => (None, None),
        };

        RemoteCallView {
            function_name: self.client.function_name().to_string(),
            endpoint: self.client.url(),
            loading: matches!(self.state, RemoteCallState::Loading),
            data,
            error,
            needs_consent: self.needs_consent,
            code_path: self.code_path.clone(),
            docs_url: self.docs_url.clone(),
        }
    }

    /// Consent if the last call asked for it, then call the function
    pub async fn reload(&mut self) -> &RemoteCallState {
        self.logger.debug("Loading function data");
        self.state = RemoteCallState::Loading;

        self.state = match self.load().await {
            Ok(data) => {
                self.logger.info("Function response received");
                self.logger.debug_with("Function result", &[data.clone()]);
                RemoteCallState::Success(data)
            }
            Err(e) => {
                self.logger
                    .error_with("Function call failed", &[json!(e.to_string())]);
                if e.needs_consent() {
                    self.logger
                        .info("The application may lack consent; consent will be requested on the next reload");
                    self.needs_consent = true;
                }
                RemoteCallState::Error(e.to_string())
            }
        };

        &self.state
    }

    async fn load(&mut self) -> Result<Value, FunctionCallError> {
        let Some(identity) = self.identity.clone() else {
            self.logger.error("Host identity provider is not initialized.");
            return Err(FunctionCallError::NotInitialized);
        };

        if self.needs_consent {
            self.logger.info_with(
                "Consent required, requesting login",
                &[json!(CONSENT_SCOPES)],
            );
            let consent = identity.login(CONSENT_SCOPES).await;
            self.needs_consent = false;
            consent.map_err(|e| FunctionCallError::Identity(e.to_string()))?;
            self.logger.info("Login and consent completed");
        }

        self.logger.info(format!(
            "Calling function '{}'",
            self.client.function_name()
        ));
        self.logger
            .debug(format!("API base URL: {}", self.client.base_url()));

        let token = identity
            .get_token(&[])
            .await
            .map_err(|e| FunctionCallError::Identity(e.to_string()))?;

        let result = self.client.call(&token).await;
        match &result {
            Ok(_) => self.logger.info(format!(
                "Function '{}' call succeeded",
                self.client.function_name()
            )),
            Err(e) => self.logger.error_with(
                format!("Function '{}' call failed", self.client.function_name()),
                &[json!(e.to_string())],
            ),
        }
        result
    }
}
