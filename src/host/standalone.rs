use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use tracing::{debug, info, warn};

use super::sdk::{
    AccessToken, HostContext, HostError, HostSdk, IdentityProvider, PermissionProbe,
    PermissionState,
};
use crate::config::HostConfig;

/// Environment variable read when consent is requested
pub const ACCESS_TOKEN_ENV: &str = "TEAMS_TAB_ACCESS_TOKEN";

/// Host used when the tab runs outside Teams.
///
/// Context comes from configuration; the access token comes from
/// configuration or, after `login`, from `TEAMS_TAB_ACCESS_TOKEN`.
pub struct StandaloneHost {
    context: HostContext,
    media_api: bool,
    initialized: AtomicBool,
    token: RwLock<Option<String>>,
}

impl StandaloneHost {
    pub fn new(config: &HostConfig) -> Self {
        Self {
            context: HostContext {
                session_id: uuid::Uuid::new_v4().to_string(),
                host_name: "standalone".to_string(),
                theme: config.theme.clone(),
                locale: config.locale.clone(),
                user: None,
            },
            media_api: config.media_api,
            initialized: AtomicBool::new(false),
            token: RwLock::new(config.access_token.clone().filter(|t| !t.is_empty())),
        }
    }
}

#[async_trait::async_trait]
impl HostSdk for StandaloneHost {
    async fn initialize(&self) -> Result<(), HostError> {
        if !self.initialized.swap(true, Ordering::SeqCst) {
            info!("Standalone host initialized (session {})", self.context.session_id);
        }
        Ok(())
    }

    async fn get_context(&self) -> Result<HostContext, HostError> {
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(HostError::NotInitialized);
        }
        Ok(self.context.clone())
    }

    fn media_api_available(&self) -> bool {
        self.media_api
    }
}

#[async_trait::async_trait]
impl PermissionProbe for StandaloneHost {
    fn permission_api_available(&self) -> bool {
        true
    }

    async fn query_microphone(&self) -> Result<PermissionState, HostError> {
        // A local process has no prompt; access is decided by the OS
        Ok(PermissionState::Granted)
    }
}

#[async_trait::async_trait]
impl IdentityProvider for StandaloneHost {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken, HostError> {
        debug!("Token requested for scopes {:?}", scopes);
        let token = self
            .token
            .read()
            .map_err(|_| HostError::Token("token store is poisoned".to_string()))?
            .clone();

        match token {
            Some(token) => Ok(AccessToken {
                token,
                expires_on: None,
            }),
            None => Err(HostError::ConsentRequired),
        }
    }

    async fn login(&self, scopes: &[&str]) -> Result<(), HostError> {
        info!("Consent requested for scopes {:?}", scopes);

        let token = std::env::var(ACCESS_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                warn!("{} is not set; consent cannot be completed", ACCESS_TOKEN_ENV);
                HostError::ConsentFailed(format!("{} is not set", ACCESS_TOKEN_ENV))
            })?;

        let mut slot = self
            .token
            .write()
            .map_err(|_| HostError::Token("token store is poisoned".to_string()))?;
        *slot = Some(token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: Option<&str>) -> HostConfig {
        HostConfig {
            theme: "dark".to_string(),
            locale: "ja-jp".to_string(),
            access_token: token.map(str::to_string),
            media_api: false,
        }
    }

    #[tokio::test]
    async fn test_context_requires_initialize() {
        let host = StandaloneHost::new(&config(None));

        assert_eq!(host.get_context().await, Err(HostError::NotInitialized));
        host.initialize().await.unwrap();

        let context = host.get_context().await.unwrap();
        assert_eq!(context.theme, "dark");
        assert_eq!(context.locale, "ja-jp");
    }

    #[tokio::test]
    async fn test_missing_token_requires_consent() {
        let host = StandaloneHost::new(&config(None));
        let err = host.get_token(&[]).await.unwrap_err();

        assert_eq!(err, HostError::ConsentRequired);
        assert!(err.to_string().contains("may not be authorized"));
    }

    #[tokio::test]
    async fn test_configured_token_is_returned() {
        let host = StandaloneHost::new(&config(Some("abc")));
        assert_eq!(host.get_token(&[]).await.unwrap().token, "abc");
    }
}
