use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::debug;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since the stream was opened
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

/// What a caller asks the device layer for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl MediaConstraints {
    /// Audio only, video explicitly disabled
    pub fn microphone_only() -> Self {
        Self {
            audio: true,
            video: false,
        }
    }
}

/// Sample format of a stream's audio tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

type StopHandler = Box<dyn FnOnce() + Send>;

/// One device track. Stopping it releases the underlying hardware (or
/// replay task) and is idempotent.
pub struct MediaStreamTrack {
    id: String,
    kind: TrackKind,
    label: String,
    stopped: AtomicBool,
    on_stop: Mutex<Option<StopHandler>>,
}

impl fmt::Debug for MediaStreamTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStreamTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("label", &self.label)
            .field("live", &self.is_live())
            .finish()
    }
}

impl MediaStreamTrack {
    pub fn new(kind: TrackKind, label: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            label: label.into(),
            stopped: AtomicBool::new(false),
            on_stop: Mutex::new(None),
        }
    }

    /// Run `handler` the first time the track is stopped
    pub fn with_stop_handler(self, handler: impl FnOnce() + Send + 'static) -> Self {
        if let Ok(mut slot) = self.on_stop.lock() {
            *slot = Some(Box::new(handler));
        }
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_live(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst)
    }

    /// Returns true if this call actually stopped the track
    pub fn stop(&self) -> bool {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return false;
        }

        let handler = self.on_stop.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handler) = handler {
            handler();
        }

        debug!("Track stopped: {} ({})", self.label, self.id);
        true
    }
}

/// A live device stream: its tracks plus the audio frames they produce.
///
/// The frame receiver can be taken exactly once, by whoever records or
/// analyses the stream.
pub struct MediaStream {
    id: String,
    tracks: Vec<Arc<MediaStreamTrack>>,
    format: StreamFormat,
    frames: Option<mpsc::Receiver<AudioFrame>>,
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.id)
            .field("tracks", &self.tracks)
            .field("format", &self.format)
            .field("frames_taken", &self.frames.is_none())
            .finish()
    }
}

impl MediaStream {
    pub fn new(
        tracks: Vec<Arc<MediaStreamTrack>>,
        format: StreamFormat,
        frames: mpsc::Receiver<AudioFrame>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tracks,
            format,
            frames: Some(frames),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tracks(&self) -> &[Arc<MediaStreamTrack>] {
        &self.tracks
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &Arc<MediaStreamTrack>> {
        self.tracks.iter().filter(|t| t.kind() == TrackKind::Audio)
    }

    pub fn format(&self) -> StreamFormat {
        self.format
    }

    pub fn take_frames(&mut self) -> Option<mpsc::Receiver<AudioFrame>> {
        self.frames.take()
    }

    /// True while at least one track is live
    pub fn is_active(&self) -> bool {
        self.tracks.iter().any(|t| t.is_live())
    }

    /// Stop every track; returns how many were still live
    pub fn stop_all_tracks(&self) -> usize {
        self.tracks.iter().filter(|t| t.stop()).count()
    }
}
