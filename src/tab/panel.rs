use serde::Serialize;
use std::sync::Arc;

use crate::capture::{AudioCapture, CaptureBackends, CaptureView};
use crate::host::HostShim;
use crate::logger::Logger;
use crate::media::ArtifactStore;
use crate::remote::{RemoteCallView, RemoteCallWidget};

/// CSS class for a host theme
pub fn theme_class(theme: &str) -> &'static str {
    match theme {
        "default" => "light",
        "dark" => "dark",
        _ => "contrast",
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WelcomeView {
    pub title: String,
    pub host_name: Option<String>,
    pub user: Option<String>,
    pub show_function: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TabView {
    pub theme_class: &'static str,
    pub welcome: WelcomeView,
    pub capture_open: bool,
    pub capture: Option<CaptureView>,
    pub function: Option<RemoteCallView>,
}

/// Root of the tab: welcome view, toggleable capture panel and the
/// optional function panel
pub struct Tab {
    title: String,
    host: Arc<HostShim>,
    backends: CaptureBackends,
    artifacts: ArtifactStore,
    logger: Logger,
    capture: Option<AudioCapture>,
    function: Option<RemoteCallWidget>,
}

impl Tab {
    /// Initialize the host and build the tab. `function` is `None` when no
    /// function is configured.
    pub async fn mount(
        title: impl Into<String>,
        host: Arc<HostShim>,
        backends: CaptureBackends,
        artifacts: ArtifactStore,
        function: Option<RemoteCallWidget>,
        logger: Logger,
    ) -> Self {
        host.mount().await;

        Self {
            title: title.into(),
            host,
            backends,
            artifacts,
            logger,
            capture: None,
            function,
        }
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    pub fn show_function(&self) -> bool {
        self.function.is_some()
    }

    pub fn capture_open(&self) -> bool {
        self.capture.is_some()
    }

    pub fn capture(&self) -> Option<&AudioCapture> {
        self.capture.as_ref()
    }

    pub fn capture_mut(&mut self) -> Option<&mut AudioCapture> {
        self.capture.as_mut()
    }

    pub fn function_mut(&mut self) -> Option<&mut RemoteCallWidget> {
        self.function.as_mut()
    }

    pub fn function(&self) -> Option<&RemoteCallWidget> {
        self.function.as_ref()
    }

    /// Open the capture panel if closed, close it if open. Returns whether
    /// the panel is now open.
    pub async fn toggle_capture(&mut self) -> bool {
        if self.capture.is_some() {
            self.close_capture();
            false
        } else {
            self.open_capture().await;
            true
        }
    }

    pub async fn open_capture(&mut self) {
        if self.capture.is_some() {
            return;
        }

        let capture = AudioCapture::mount(
            Arc::clone(&self.host),
            self.backends.clone(),
            self.artifacts.clone(),
            self.logger.child("AudioCapture"),
        )
        .await;
        self.capture = Some(capture);
        self.logger.info("Audio capture opened");
    }

    /// Unmount the capture panel; returns device tracks released
    pub fn close_capture(&mut self) -> usize {
        match self.capture.take() {
            Some(mut capture) => {
                let released = capture.unmount();
                self.logger.info("Audio capture closed");
                released
            }
            None => 0,
        }
    }

    pub fn view(&self) -> TabView {
        let context = self.host.context();
        let theme = context
            .as_ref()
            .map(|c| c.theme.as_str())
            .unwrap_or("default");

        TabView {
            theme_class: theme_class(theme),
            welcome: WelcomeView {
                title: self.title.clone(),
                host_name: context.as_ref().map(|c| c.host_name.clone()),
                user: context
                    .as_ref()
                    .and_then(|c| c.user.as_ref())
                    .map(|u| u.display_name.clone().unwrap_or_else(|| u.id.clone())),
                show_function: self.show_function(),
            },
            capture_open: self.capture_open(),
            capture: self.capture.as_ref().map(AudioCapture::view),
            function: self.function.as_ref().map(RemoteCallWidget::view),
        }
    }
}
