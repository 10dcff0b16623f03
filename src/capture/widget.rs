use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use super::session::{pump_fragments, ArtifactSummary, CaptureSession, FragmentBuffer, RecordedArtifact};
use super::state::{CaptureState, StateCell};
use crate::host::HostShim;
use crate::logger::Logger;
use crate::media::{
    ArtifactStore, MediaConstraints, MediaDevices, MediaRecorder, PlaybackElement, PlaybackSource,
    RecorderFactory,
};

/// Device and recorder capabilities used by the capture panel
#[derive(Clone)]
pub struct CaptureBackends {
    pub devices: Arc<dyn MediaDevices>,
    pub recorders: Arc<dyn RecorderFactory>,
}

/// Serializable snapshot of the capture panel
#[derive(Debug, Clone, Serialize)]
pub struct CaptureView {
    pub state: CaptureState,
    pub is_recording: bool,
    pub error: Option<String>,
    pub playback: PlaybackSource,
    pub artifact: Option<ArtifactSummary>,
}

/// The microphone capture panel.
///
/// Owns at most one capture session at a time. Every exit path (stop,
/// failed start, unmount, drop) stops the device tracks it acquired.
pub struct AudioCapture {
    host: Arc<HostShim>,
    backends: CaptureBackends,
    artifacts: ArtifactStore,
    logger: Logger,
    state: StateCell,
    session: Option<CaptureSession>,
    artifact: Option<RecordedArtifact>,
    playback: PlaybackElement,
    error: Option<String>,
}

impl AudioCapture {
    /// Create the panel and initialize the host context for it
    pub async fn mount(
        host: Arc<HostShim>,
        backends: CaptureBackends,
        artifacts: ArtifactStore,
        logger: Logger,
    ) -> Self {
        logger.debug_with(
            "Mounting audio capture",
            &[json!(backends.devices.name())],
        );
        host.mount().await;

        Self {
            host,
            backends,
            artifacts,
            logger,
            state: StateCell::default(),
            session: None,
            artifact: None,
            playback: PlaybackElement::default(),
            error: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state.get()
    }

    pub fn is_recording(&self) -> bool {
        self.state().is_recording()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn artifact(&self) -> Option<&RecordedArtifact> {
        self.artifact.as_ref()
    }

    pub fn playback(&self) -> &PlaybackElement {
        &self.playback
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn view(&self) -> CaptureView {
        CaptureView {
            state: self.state(),
            is_recording: self.is_recording(),
            error: self.error.clone(),
            playback: self.playback.source().clone(),
            artifact: self.artifact.as_ref().map(RecordedArtifact::summary),
        }
    }

    /// Acquire the microphone and start recording. No-op unless idle.
    pub async fn start(&mut self) {
        let current = self.state();
        if !current.can_start() {
            self.logger
                .warn(format!("Start ignored: capture is {}", current));
            return;
        }

        self.error = None;
        // Back to Idle on every early return, and if this future is dropped
        let transition = self.state.begin(CaptureState::Requesting);

        if let Err(e) = self.host.revalidate().await {
            self.logger
                .error_with("Host initialization failed", &[json!(e.to_string())]);
            self.fail(format!("Host initialization error: {}", e));
            return;
        }

        self.logger.info("Requesting microphone access");
        let mut stream = match self
            .backends
            .devices
            .get_user_media(MediaConstraints::microphone_only())
            .await
        {
            Ok(stream) => stream,
            Err(e) => {
                self.logger
                    .error_with("Failed to acquire audio", &[json!(e.to_string())]);
                self.fail(format!("Failed to acquire audio: {}", e));
                return;
            }
        };

        // Live monitor while recording
        self.playback.attach_stream(&stream);

        let started = self
            .backends
            .recorders
            .create(&mut stream)
            .and_then(|mut recorder| recorder.start().map(|events| (recorder, events)));

        let (recorder, events) = match started {
            Ok(pair) => pair,
            Err(e) => {
                let released = stream.stop_all_tracks();
                self.logger.error_with(
                    "Failed to start recorder",
                    &[json!(e.to_string()), json!({ "tracks_released": released })],
                );
                self.playback.clear();
                self.fail(format!("Failed to acquire audio: {}", e));
                return;
            }
        };

        self.logger.info_with(
            "Recording started",
            &[json!({
                "stream": stream.id(),
                "audio_tracks": stream.audio_tracks().count(),
                "mime_type": recorder.mime_type(),
            })],
        );

        let pump = tokio::spawn(pump_fragments(events, self.logger.clone()));
        self.session = Some(CaptureSession {
            stream,
            recorder,
            pump: Some(pump),
        });
        transition.complete(CaptureState::Recording);
    }

    /// Finalize the recording. No-op unless recording.
    pub async fn stop(&mut self) {
        let current = self.state();
        if !current.can_stop() {
            self.logger
                .debug(format!("Stop ignored: capture is {}", current));
            return;
        }

        let Some(mut session) = self.session.take() else {
            self.state.set(CaptureState::Idle);
            return;
        };

        // If this future is dropped while waiting on the recorder, the
        // session drop stops the tracks and the state falls back to Idle
        let transition = self.state.begin(CaptureState::Stopping);
        self.playback.clear();
        session.recorder.stop();

        let buffer = match session.pump.take() {
            Some(pump) => match pump.await {
                Ok(buffer) => buffer,
                Err(e) => {
                    self.logger
                        .error_with("Recorder pump failed", &[json!(e.to_string())]);
                    FragmentBuffer::default()
                }
            },
            None => FragmentBuffer::default(),
        };

        self.finalize(buffer, session.recorder.as_ref());

        let released = session.release();
        drop(session);

        self.logger.info_with(
            "Recording stopped",
            &[json!({
                "tracks_released": released,
                "bytes": self.artifact.as_ref().map(RecordedArtifact::len),
            })],
        );
        transition.complete(CaptureState::Idle);
    }

    /// Tear the panel down, releasing the device if still recording.
    /// Returns the number of tracks stopped.
    pub fn unmount(&mut self) -> usize {
        let released = self.release_resources();
        self.logger.debug_with(
            "Audio capture unmounted",
            &[json!({ "tracks_released": released })],
        );
        released
    }

    fn release_resources(&mut self) -> usize {
        let released = self
            .session
            .take()
            .map(|mut session| session.release())
            .unwrap_or(0);

        if let Some(artifact) = self.artifact.take() {
            self.artifacts.revoke(&artifact.url);
        }
        self.playback.clear();
        self.state.set(CaptureState::Idle);
        released
    }

    fn finalize(&mut self, buffer: FragmentBuffer, recorder: &dyn MediaRecorder) {
        let mime_type = recorder.mime_type();
        let fragment_count = buffer.fragments.len();
        self.logger.debug_with(
            "Assembling recording",
            &[json!({
                "fragments": fragment_count,
                "empty_events": buffer.empty_events,
                "bytes": buffer.total_bytes(),
            })],
        );

        let mut recording = buffer.assemble();
        recorder.seal(&mut recording);
        let bytes = Arc::new(recording);

        if let Some(previous) = self.artifact.take() {
            self.artifacts.revoke(&previous.url);
        }

        let url = self.artifacts.create_object_url(Arc::clone(&bytes), mime_type);
        self.playback.load_url(url.clone());

        self.artifact = Some(RecordedArtifact {
            bytes,
            mime_type: mime_type.to_string(),
            url,
            fragment_count,
            recorded_at: Utc::now(),
        });
    }

    fn fail(&mut self, message: String) {
        self.error = Some(message);
        self.state.set(CaptureState::Idle);
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        self.release_resources();
    }
}
