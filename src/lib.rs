pub mod app;
pub mod capture;
pub mod config;
pub mod host;
pub mod logger;
pub mod media;
pub mod remote;
pub mod tab;

pub use capture::{AudioCapture, CaptureBackends, CaptureState, CaptureView, RecordedArtifact};
pub use config::Config;
pub use host::{HostContext, HostError, HostSdk, HostShim, IdentityProvider, PermissionProbe, StandaloneHost};
pub use logger::{LogLevel, Logger, LoggerOptions};
pub use media::{
    ArtifactStore, FileMicrophone, MediaDevices, MediaError, MediaStream, MediaStreamTrack,
    RecorderFactory, WavRecorderFactory,
};
pub use remote::{FunctionCallError, FunctionClient, RemoteCallState, RemoteCallWidget};
pub use tab::{create_router, AppState, Tab};
