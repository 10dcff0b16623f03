use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::error::{classify, CallFailure, FunctionCallError};
use crate::host::AccessToken;

/// HTTP client for the companion function app: `GET {endpoint}/api/{name}`
#[derive(Debug, Clone)]
pub struct FunctionClient {
    http: reqwest::Client,
    base_url: String,
    function_name: String,
}

impl FunctionClient {
    pub fn new(
        api_endpoint: &str,
        function_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: format!("{}/api/", api_endpoint.trim_end_matches('/')),
            function_name: function_name.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, self.function_name)
    }

    /// Call the function with `token` as bearer credential
    pub async fn call(&self, token: &AccessToken) -> Result<Value, FunctionCallError> {
        let url = self.url();
        debug!("Sending request to {}", url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&token.token)
            .send()
            .await
            .map_err(|e| classify(&transport_failure(&url, &e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            classify(&CallFailure {
                url: url.clone(),
                status: Some(status.as_u16()),
                network: false,
                message: e.to_string(),
                server_error: None,
            })
        })?;

        if !status.is_success() {
            return Err(classify(&CallFailure {
                url,
                status: Some(status.as_u16()),
                network: false,
                message: format!("Request failed with status code {}", status.as_u16()),
                server_error: server_error(&body),
            }));
        }

        debug!("Function responded with {} ({} bytes)", status, body.len());
        Ok(parse_body(&body))
    }
}

fn transport_failure(url: &str, err: &reqwest::Error) -> CallFailure {
    CallFailure {
        url: url.to_string(),
        status: err.status().map(|s| s.as_u16()),
        network: err.is_connect() || err.is_timeout() || err.is_request(),
        message: err.to_string(),
        server_error: None,
    }
}

/// `error` field of a JSON error body, if any
fn server_error(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("error")? {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

/// JSON when the body parses, the raw text otherwise, null when empty
fn parse_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}
