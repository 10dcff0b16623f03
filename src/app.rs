use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::capture::CaptureBackends;
use crate::config::{CaptureSourceKind, Config};
use crate::host::{HostSdk, HostShim, IdentityProvider, PermissionProbe, StandaloneHost};
use crate::logger::{Logger, LoggerOptions};
use crate::media::{ArtifactStore, FileMicrophone, MediaDevices, WavRecorderFactory};
use crate::remote::{FunctionClient, RemoteCallWidget};
use crate::tab::Tab;

/// Device backend selected by `capture.source`
pub fn media_devices(config: &Config) -> Result<Arc<dyn MediaDevices>> {
    match config.capture.source {
        CaptureSourceKind::File => {
            info!("Capture source: file {}", config.capture.file_path.display());
            Ok(Arc::new(FileMicrophone::new(
                config.capture.file_path.clone(),
                config.capture.frame_ms,
            )))
        }
        CaptureSourceKind::Microphone => {
            #[cfg(feature = "microphone")]
            {
                info!("Capture source: default microphone");
                Ok(Arc::new(crate::media::CpalMicrophone::new(None)))
            }

            #[cfg(not(feature = "microphone"))]
            {
                anyhow::bail!("Microphone capture requires the `microphone` feature")
            }
        }
    }
}

/// Wire the standalone host, capture backends and function panel into a tab
pub async fn build_tab(config: &Config) -> Result<Tab> {
    let logger = Logger::new(LoggerOptions::with_context("Tab", config.logging.level));

    let host = Arc::new(StandaloneHost::new(&config.host));
    let sdk: Arc<dyn HostSdk> = host.clone();
    let permissions: Arc<dyn PermissionProbe> = host.clone();
    let shim = Arc::new(HostShim::new(sdk, Some(permissions), logger.child("HostShim")));

    let backends = CaptureBackends {
        devices: media_devices(config)?,
        recorders: Arc::new(WavRecorderFactory::new(Duration::from_millis(
            config.capture.timeslice_ms,
        ))),
    };

    let function = match config.function.name.as_deref().filter(|_| config.show_function()) {
        Some(name) => {
            let client = FunctionClient::new(
                &config.function.api_endpoint,
                name,
                Duration::from_secs(config.function.request_timeout_secs),
            )
            .context("Failed to build function HTTP client")?;
            info!("Function panel enabled: {}", client.url());

            let identity: Arc<dyn IdentityProvider> = host.clone();
            Some(RemoteCallWidget::new(
                Some(identity),
                client,
                logger.child("RemoteCall"),
            ))
        }
        None => None,
    };

    Ok(Tab::mount(
        config.service.name.clone(),
        shim,
        backends,
        ArtifactStore::default(),
        function,
        logger,
    )
    .await)
}
