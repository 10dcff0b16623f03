// Fakes for the host, device and recorder capabilities shared by the
// integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use teams_audio_tab::capture::{AudioCapture, CaptureBackends};
use teams_audio_tab::host::{
    AccessToken, HostContext, HostError, HostSdk, HostShim, IdentityProvider, PermissionProbe,
    PermissionState,
};
use teams_audio_tab::logger::{LogLevel, Logger, LoggerOptions, MemorySink};
use teams_audio_tab::media::{
    ArtifactStore, AudioFrame, MediaConstraints, MediaDevices, MediaError, MediaRecorder,
    MediaResult, MediaStream, MediaStreamTrack, RecorderEvent, RecorderFactory, RecorderState,
    StreamFormat, TrackKind,
};
use tokio::sync::mpsc;

// ============================================================================
// Host
// ============================================================================

pub struct FakeHost {
    pub theme: String,
    pub init_calls: AtomicUsize,
    pub context_calls: AtomicUsize,
    pub fail_init: AtomicBool,
    pub fail_context: AtomicBool,
    pub permission_api: bool,
    pub permission_query_fails: bool,
    pub media_api: bool,
    pub tokens: Mutex<VecDeque<Result<String, HostError>>>,
    pub token_calls: AtomicUsize,
    pub login_calls: AtomicUsize,
    pub login_result: Mutex<Result<(), HostError>>,
    pub login_scopes: Mutex<Vec<Vec<String>>>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            theme: "default".to_string(),
            init_calls: AtomicUsize::new(0),
            context_calls: AtomicUsize::new(0),
            fail_init: AtomicBool::new(false),
            fail_context: AtomicBool::new(false),
            permission_api: true,
            permission_query_fails: false,
            media_api: true,
            tokens: Mutex::new(VecDeque::new()),
            token_calls: AtomicUsize::new(0),
            login_calls: AtomicUsize::new(0),
            login_result: Mutex::new(Ok(())),
            login_scopes: Mutex::new(Vec::new()),
        }
    }
}

impl FakeHost {
    pub fn with_theme(theme: &str) -> Self {
        Self {
            theme: theme.to_string(),
            ..Self::default()
        }
    }

    /// Queue the outcomes of the next `get_token` calls; afterwards
    /// "test-token" is returned
    pub fn queue_tokens(&self, tokens: Vec<Result<String, HostError>>) {
        self.tokens.lock().unwrap().extend(tokens);
    }
}

#[async_trait::async_trait]
impl HostSdk for FakeHost {
    async fn initialize(&self) -> Result<(), HostError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_init.load(Ordering::SeqCst) {
            return Err(HostError::InitializationFailed("host unreachable".to_string()));
        }
        Ok(())
    }

    async fn get_context(&self) -> Result<HostContext, HostError> {
        self.context_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_context.load(Ordering::SeqCst) {
            return Err(HostError::ContextUnavailable("not running in a host".to_string()));
        }
        Ok(HostContext {
            session_id: "session-1".to_string(),
            host_name: "Teams".to_string(),
            theme: self.theme.clone(),
            locale: "en-us".to_string(),
            user: None,
        })
    }

    fn media_api_available(&self) -> bool {
        self.media_api
    }
}

#[async_trait::async_trait]
impl PermissionProbe for FakeHost {
    fn permission_api_available(&self) -> bool {
        self.permission_api
    }

    async fn query_microphone(&self) -> Result<PermissionState, HostError> {
        if self.permission_query_fails {
            return Err(HostError::PermissionApiUnsupported("microphone".to_string()));
        }
        Ok(PermissionState::Prompt)
    }
}

#[async_trait::async_trait]
impl IdentityProvider for FakeHost {
    async fn get_token(&self, _scopes: &[&str]) -> Result<AccessToken, HostError> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.tokens.lock().unwrap().pop_front();
        match next.unwrap_or_else(|| Ok("test-token".to_string())) {
            Ok(token) => Ok(AccessToken {
                token,
                expires_on: None,
            }),
            Err(e) => Err(e),
        }
    }

    async fn login(&self, scopes: &[&str]) -> Result<(), HostError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.login_scopes
            .lock()
            .unwrap()
            .push(scopes.iter().map(|s| s.to_string()).collect());
        self.login_result.lock().unwrap().clone()
    }
}

// ============================================================================
// Devices
// ============================================================================

pub struct FakeDevices {
    pub tracks_per_stream: usize,
    pub requests: AtomicUsize,
    pub stopped_tracks: Arc<AtomicUsize>,
    pub tracks: Mutex<Vec<Arc<MediaStreamTrack>>>,
    pub fail_with: Mutex<Option<String>>,
    /// Next request never resolves
    pub hang_next: AtomicBool,
    pub last_constraints: Mutex<Option<MediaConstraints>>,
    senders: Mutex<Vec<mpsc::Sender<AudioFrame>>>,
}

impl FakeDevices {
    pub fn new(tracks_per_stream: usize) -> Self {
        Self {
            tracks_per_stream,
            requests: AtomicUsize::new(0),
            stopped_tracks: Arc::new(AtomicUsize::new(0)),
            tracks: Mutex::new(Vec::new()),
            fail_with: Mutex::new(None),
            hang_next: AtomicBool::new(false),
            last_constraints: Mutex::new(None),
            senders: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_next(&self, reason: &str) {
        *self.fail_with.lock().unwrap() = Some(reason.to_string());
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped_tracks.load(Ordering::SeqCst)
    }

    pub fn live_tracks(&self) -> usize {
        self.tracks.lock().unwrap().iter().filter(|t| t.is_live()).count()
    }
}

#[async_trait::async_trait]
impl MediaDevices for FakeDevices {
    async fn get_user_media(&self, constraints: MediaConstraints) -> MediaResult<MediaStream> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        *self.last_constraints.lock().unwrap() = Some(constraints);

        if let Some(reason) = self.fail_with.lock().unwrap().take() {
            return Err(MediaError::NotAllowed(reason));
        }
        if self.hang_next.swap(false, Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        let (tx, rx) = mpsc::channel(8);
        self.senders.lock().unwrap().push(tx);

        let tracks: Vec<Arc<MediaStreamTrack>> = (0..self.tracks_per_stream)
            .map(|i| {
                let stopped = Arc::clone(&self.stopped_tracks);
                Arc::new(
                    MediaStreamTrack::new(TrackKind::Audio, format!("fake-mic-{}", i))
                        .with_stop_handler(move || {
                            stopped.fetch_add(1, Ordering::SeqCst);
                        }),
                )
            })
            .collect();
        self.tracks.lock().unwrap().extend(tracks.iter().cloned());

        Ok(MediaStream::new(
            tracks,
            StreamFormat {
                sample_rate: 16000,
                channels: 1,
            },
            rx,
        ))
    }

    fn name(&self) -> &str {
        "fake"
    }
}

// ============================================================================
// Recorder
// ============================================================================

/// Emits its scripted fragments on start and `Stopped` on stop
pub struct FakeRecorderFactory {
    pub fragments: Vec<Vec<u8>>,
    pub created: AtomicUsize,
    pub fail_create: AtomicBool,
    /// Recorders never finalize after `stop()`
    pub hold_stop: AtomicBool,
}

impl FakeRecorderFactory {
    pub fn new(fragments: Vec<Vec<u8>>) -> Self {
        Self {
            fragments,
            created: AtomicUsize::new(0),
            fail_create: AtomicBool::new(false),
            hold_stop: AtomicBool::new(false),
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl RecorderFactory for FakeRecorderFactory {
    fn create(&self, stream: &mut MediaStream) -> MediaResult<Box<dyn MediaRecorder>> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(MediaError::Recorder("no encoder available".to_string()));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        let _frames = stream.take_frames();

        Ok(Box::new(FakeRecorder {
            fragments: self.fragments.clone(),
            tx: None,
            state: RecorderState::Inactive,
            hold_stop: self.hold_stop.load(Ordering::SeqCst),
        }))
    }
}

pub struct FakeRecorder {
    fragments: Vec<Vec<u8>>,
    tx: Option<mpsc::Sender<RecorderEvent>>,
    state: RecorderState,
    hold_stop: bool,
}

impl MediaRecorder for FakeRecorder {
    fn mime_type(&self) -> &str {
        "audio/fake"
    }

    fn start(&mut self) -> MediaResult<mpsc::Receiver<RecorderEvent>> {
        let (tx, rx) = mpsc::channel(self.fragments.len() + 2);
        for fragment in &self.fragments {
            tx.try_send(RecorderEvent::DataAvailable(fragment.clone()))
                .expect("channel sized for the script");
        }
        self.tx = Some(tx);
        self.state = RecorderState::Recording;
        Ok(rx)
    }

    fn stop(&mut self) {
        self.state = RecorderState::Inactive;
        if self.hold_stop {
            return;
        }
        if let Some(tx) = self.tx.take() {
            let _ = tx.try_send(RecorderEvent::Stopped);
        }
    }

    fn state(&self) -> RecorderState {
        self.state
    }
}

// ============================================================================
// Wiring
// ============================================================================

pub fn memory_logger(context: &str) -> (Logger, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let logger = Logger::with_sink(
        LoggerOptions::with_context(context, LogLevel::Debug),
        sink.clone(),
    );
    (logger, sink)
}

pub fn shim_for(host: &Arc<FakeHost>) -> Arc<HostShim> {
    let sdk: Arc<dyn HostSdk> = host.clone();
    let permissions: Arc<dyn PermissionProbe> = host.clone();
    let (logger, _) = memory_logger("HostShim");
    Arc::new(HostShim::new(sdk, Some(permissions), logger))
}

pub fn backends(devices: &Arc<FakeDevices>, recorders: &Arc<FakeRecorderFactory>) -> CaptureBackends {
    CaptureBackends {
        devices: devices.clone(),
        recorders: recorders.clone(),
    }
}

pub struct Harness {
    pub host: Arc<FakeHost>,
    pub devices: Arc<FakeDevices>,
    pub recorders: Arc<FakeRecorderFactory>,
    pub artifacts: ArtifactStore,
    pub capture: AudioCapture,
}

pub async fn mount_capture(fragments: Vec<Vec<u8>>, tracks_per_stream: usize) -> Harness {
    let host = Arc::new(FakeHost::default());
    let devices = Arc::new(FakeDevices::new(tracks_per_stream));
    let recorders = Arc::new(FakeRecorderFactory::new(fragments));
    let artifacts = ArtifactStore::default();
    let (logger, _) = memory_logger("AudioCapture");

    let capture = AudioCapture::mount(
        shim_for(&host),
        backends(&devices, &recorders),
        artifacts.clone(),
        logger,
    )
    .await;

    Harness {
        host,
        devices,
        recorders,
        artifacts,
        capture,
    }
}
