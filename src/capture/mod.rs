//! Microphone capture panel
//!
//! `AudioCapture` drives the explicit `CaptureState` machine over the
//! device, recorder and playback capabilities from `media`.

mod session;
mod state;
mod widget;

pub use session::{ArtifactSummary, FragmentBuffer, RecordedArtifact};
pub use state::CaptureState;
pub use widget::{AudioCapture, CaptureBackends, CaptureView};
