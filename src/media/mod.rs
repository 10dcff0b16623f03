//! Device media and recorder capabilities
//!
//! - `MediaDevices` hands out microphone streams (`FileMicrophone`,
//!   `CpalMicrophone` behind the `microphone` feature)
//! - `RecorderFactory`/`MediaRecorder` turn a stream into encoded fragments
//! - `PlaybackElement`/`ArtifactStore` bind recordings to playable URLs

pub mod device;
pub mod error;
pub mod file;
pub mod playback;
pub mod recorder;
pub mod stream;

#[cfg(feature = "microphone")]
pub mod microphone;

pub use device::{FileMicrophone, MediaDevices};
pub use error::{MediaError, MediaResult};
pub use file::AudioFile;
pub use playback::{ArtifactStore, PlaybackElement, PlaybackSource, StoredArtifact};
pub use recorder::{
    seal_wav_sizes, streaming_wav_header, MediaRecorder, RecorderEvent, RecorderFactory, RecorderState, WavRecorder,
    WavRecorderFactory,
};
pub use stream::{AudioFrame, MediaConstraints, MediaStream, MediaStreamTrack, StreamFormat, TrackKind};

#[cfg(feature = "microphone")]
pub use microphone::CpalMicrophone;
