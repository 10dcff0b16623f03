use serde::Serialize;
use serde_json::json;
use std::sync::{Arc, RwLock};
use tokio::sync::OnceCell;

use super::sdk::{HostContext, HostError, HostSdk, PermissionProbe, PermissionState};
use crate::logger::Logger;

/// Diagnostic outcome of the permission/media probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    pub permission_api: bool,
    pub microphone: Option<PermissionState>,
    pub host_media_api: bool,
}

/// Owns the host SDK for the panel: initializes it once and keeps the
/// latest good context around.
pub struct HostShim {
    sdk: Arc<dyn HostSdk>,
    permissions: Option<Arc<dyn PermissionProbe>>,
    init: OnceCell<Result<HostContext, HostError>>,
    latest: RwLock<Option<HostContext>>,
    logger: Logger,
}

impl HostShim {
    pub fn new(
        sdk: Arc<dyn HostSdk>,
        permissions: Option<Arc<dyn PermissionProbe>>,
        logger: Logger,
    ) -> Self {
        Self {
            sdk,
            permissions,
            init: OnceCell::new(),
            latest: RwLock::new(None),
            logger,
        }
    }

    /// Initialize the host context (only the first call reaches the SDK),
    /// then run the diagnostic probe. Never fails; failures are logged.
    pub async fn mount(&self) -> Option<HostContext> {
        let outcome = self
            .init
            .get_or_init(|| async {
                self.sdk.initialize().await?;
                self.sdk.get_context().await
            })
            .await;

        match outcome {
            Ok(context) => {
                self.logger.info("Host SDK initialized");
                self.logger.debug_with(
                    "Host context",
                    &[serde_json::to_value(context).unwrap_or_default()],
                );
                self.remember(context);
                self.probe().await;
                Some(context.clone())
            }
            Err(e) => {
                self.logger
                    .error_with("Host SDK initialization failed", &[json!(e.to_string())]);
                None
            }
        }
    }

    /// Context from a successful mount, or from the last successful
    /// revalidate when that is more recent
    pub fn context(&self) -> Option<HostContext> {
        self.latest
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn remember(&self, context: &HostContext) {
        *self.latest.write().unwrap_or_else(|e| e.into_inner()) = Some(context.clone());
    }

    /// Re-check the host before capture: fresh context, then initialize
    pub async fn revalidate(&self) -> Result<HostContext, HostError> {
        let context = self.sdk.get_context().await?;
        self.logger.debug_with(
            "Host context refreshed",
            &[serde_json::to_value(&context).unwrap_or_default()],
        );

        self.sdk.initialize().await?;
        if self.sdk.media_api_available() {
            self.logger.debug("Requesting media permission through the host");
        }

        self.remember(&context);
        Ok(context)
    }

    /// Best-effort permission and media API check, for logging only
    pub async fn probe(&self) -> ProbeReport {
        let mut report = ProbeReport {
            permission_api: false,
            microphone: None,
            host_media_api: false,
        };

        match &self.permissions {
            Some(permissions) if permissions.permission_api_available() => {
                report.permission_api = true;
                self.logger.info("Device media API is available");

                match permissions.query_microphone().await {
                    Ok(state) => {
                        report.microphone = Some(state);
                        self.logger
                            .info_with("Microphone permission state", &[json!(state)]);
                    }
                    Err(e) => {
                        self.logger.error_with(
                            "Permission API is not supported",
                            &[json!(e.to_string())],
                        );
                    }
                }
            }
            _ => self.logger.info("Device media API is not available"),
        }

        if self.sdk.media_api_available() {
            report.host_media_api = true;
            self.logger.info("Host media API is available");
        }

        report
    }
}
