use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace};

use super::error::{MediaError, MediaResult};
use super::file::AudioFile;
use super::stream::{AudioFrame, MediaConstraints, MediaStream, MediaStreamTrack, StreamFormat, TrackKind};

/// Device media capability: hands out live input streams.
///
/// Implementations:
/// - `FileMicrophone`: replays a WAV file in real time (default)
/// - `CpalMicrophone`: default input device (`microphone` feature)
#[async_trait::async_trait]
pub trait MediaDevices: Send + Sync {
    /// Acquire a stream matching `constraints`
    async fn get_user_media(&self, constraints: MediaConstraints) -> MediaResult<MediaStream>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Only audio capture is available from these backends
pub(crate) fn ensure_audio_only(constraints: MediaConstraints) -> MediaResult<()> {
    if constraints.video {
        return Err(MediaError::NotSupported("video capture".to_string()));
    }
    if !constraints.audio {
        return Err(MediaError::NotSupported(
            "at least one of audio or video must be requested".to_string(),
        ));
    }
    Ok(())
}

/// Plays a WAV file back as a live microphone, looping at the end
pub struct FileMicrophone {
    path: PathBuf,
    frame_ms: u64,
}

impl FileMicrophone {
    pub fn new(path: impl Into<PathBuf>, frame_ms: u64) -> Self {
        Self {
            path: path.into(),
            frame_ms: frame_ms.max(1),
        }
    }
}

#[async_trait::async_trait]
impl MediaDevices for FileMicrophone {
    async fn get_user_media(&self, constraints: MediaConstraints) -> MediaResult<MediaStream> {
        ensure_audio_only(constraints)?;

        let path = self.path.clone();
        let audio = tokio::task::spawn_blocking(move || AudioFile::open(path))
            .await
            .map_err(|e| MediaError::NotReadable(format!("file reader task failed: {}", e)))??;

        let format = StreamFormat {
            sample_rate: audio.sample_rate,
            channels: audio.channels,
        };
        let label = format!("File microphone ({})", audio.path);

        let (frame_tx, frame_rx) = mpsc::channel(64);
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        tokio::spawn(replay(audio, self.frame_ms, frame_tx, stop_rx));

        let track = MediaStreamTrack::new(TrackKind::Audio, label).with_stop_handler(move || {
            let _ = stop_tx.send(());
        });

        info!(
            "File microphone opened ({}Hz, {} channels)",
            format.sample_rate, format.channels
        );

        Ok(MediaStream::new(vec![Arc::new(track)], format, frame_rx))
    }

    fn name(&self) -> &str {
        "file"
    }
}

async fn replay(
    audio: AudioFile,
    frame_ms: u64,
    frame_tx: mpsc::Sender<AudioFrame>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let frame_len = audio.samples_per_frame(frame_ms);
    let mut ticker = tokio::time::interval(Duration::from_millis(frame_ms));
    let mut offset = 0usize;
    let mut timestamp_ms = 0u64;

    loop {
        tokio::select! {
            // Also resolves when the track is dropped without being stopped
            _ = &mut stop_rx => break,
            _ = ticker.tick() => {
                let end = (offset + frame_len).min(audio.samples.len());
                let frame = AudioFrame {
                    samples: audio.samples[offset..end].to_vec(),
                    sample_rate: audio.sample_rate,
                    channels: audio.channels,
                    timestamp_ms,
                };
                offset = if end >= audio.samples.len() { 0 } else { end };
                timestamp_ms += frame_ms;

                match frame_tx.try_send(frame) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        trace!("Frame consumer is behind, dropping frame");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                }
            }
        }
    }

    debug!("File microphone replay stopped after {}ms", timestamp_ms);
}
