use serde::Serialize;
use std::io::Cursor;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::error::{MediaError, MediaResult};
use super::stream::{AudioFrame, MediaStream, StreamFormat};

/// Events emitted by a running recorder, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderEvent {
    /// One encoded fragment; may be empty when nothing arrived in a timeslice
    DataAvailable(Vec<u8>),
    /// Non-fatal recorder problem
    Error(String),
    /// Final event after `stop()`; no data follows
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderState {
    Inactive,
    Recording,
}

/// Recorder capability bound to one stream
pub trait MediaRecorder: Send {
    /// Encoding chosen by the recorder
    fn mime_type(&self) -> &str;

    /// Begin recording; events arrive on the returned receiver
    fn start(&mut self) -> MediaResult<mpsc::Receiver<RecorderEvent>>;

    /// Request finalization. Remaining data is flushed, then `Stopped`.
    fn stop(&mut self);

    fn state(&self) -> RecorderState;

    /// Fix up the assembled recording once its length is known. The length
    /// must not change.
    fn seal(&self, _recording: &mut [u8]) {}
}

/// Builds recorders for acquired streams
pub trait RecorderFactory: Send + Sync {
    fn create(&self, stream: &mut MediaStream) -> MediaResult<Box<dyn MediaRecorder>>;
}

/// WAV header with RIFF and data sizes set to `u32::MAX`, the usual marker
/// for a stream of unknown length
pub fn streaming_wav_header(format: StreamFormat) -> MediaResult<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    hound::WavWriter::new(&mut cursor, spec)?.finalize()?;
    let mut header = cursor.into_inner();

    let len = header.len();
    if len < 12 {
        return Err(MediaError::Recorder("WAV header too short".to_string()));
    }
    header[4..8].copy_from_slice(&u32::MAX.to_le_bytes());
    header[len - 4..].copy_from_slice(&u32::MAX.to_le_bytes());

    Ok(header)
}

/// Write the real RIFF and data chunk sizes into a recording that starts
/// with a streaming header. Returns false when no data chunk is found.
pub fn seal_wav_sizes(recording: &mut [u8]) -> bool {
    if recording.len() < 12 || &recording[0..4] != b"RIFF" || &recording[8..12] != b"WAVE" {
        return false;
    }

    let mut offset = 12;
    while offset + 8 <= recording.len() {
        let id = &recording[offset..offset + 4];
        if id == b"data" {
            let data_len = recording.len() - (offset + 8);
            recording[offset + 4..offset + 8].copy_from_slice(&chunk_size(data_len));
            let riff_len = recording.len() - 8;
            recording[4..8].copy_from_slice(&chunk_size(riff_len));
            return true;
        }

        let mut size = [0u8; 4];
        size.copy_from_slice(&recording[offset + 4..offset + 8]);
        let size = u32::from_le_bytes(size) as usize;
        // Chunks are word aligned
        offset += 8 + size + (size & 1);
    }

    false
}

fn chunk_size(len: usize) -> [u8; 4] {
    u32::try_from(len).unwrap_or(u32::MAX).to_le_bytes()
}

/// Creates `WavRecorder`s with a fixed fragment interval
#[derive(Debug, Clone)]
pub struct WavRecorderFactory {
    timeslice: Duration,
}

impl WavRecorderFactory {
    pub fn new(timeslice: Duration) -> Self {
        Self {
            timeslice: timeslice.max(Duration::from_millis(10)),
        }
    }
}

impl RecorderFactory for WavRecorderFactory {
    fn create(&self, stream: &mut MediaStream) -> MediaResult<Box<dyn MediaRecorder>> {
        if stream.audio_tracks().next().is_none() {
            return Err(MediaError::Recorder("stream has no audio track".to_string()));
        }

        let frames = stream
            .take_frames()
            .ok_or_else(|| MediaError::Recorder("stream is already being recorded".to_string()))?;

        Ok(Box::new(WavRecorder::new(frames, stream.format(), self.timeslice)))
    }
}

/// Encodes a stream as 16-bit PCM WAV.
///
/// The first fragment is the WAV header; each later fragment carries the PCM
/// bytes gathered during one timeslice, so concatenating all fragments gives
/// a playable file.
pub struct WavRecorder {
    frames: Option<mpsc::Receiver<AudioFrame>>,
    format: StreamFormat,
    timeslice: Duration,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    state: RecorderState,
}

impl WavRecorder {
    pub fn new(frames: mpsc::Receiver<AudioFrame>, format: StreamFormat, timeslice: Duration) -> Self {
        Self {
            frames: Some(frames),
            format,
            timeslice,
            stop_tx: None,
            task: None,
            state: RecorderState::Inactive,
        }
    }
}

impl MediaRecorder for WavRecorder {
    fn mime_type(&self) -> &str {
        "audio/wav"
    }

    fn start(&mut self) -> MediaResult<mpsc::Receiver<RecorderEvent>> {
        let frames = self
            .frames
            .take()
            .ok_or_else(|| MediaError::Recorder("recorder was already started".to_string()))?;
        let header = streaming_wav_header(self.format)?;

        let (event_tx, event_rx) = mpsc::channel(32);
        let (stop_tx, stop_rx) = oneshot::channel();

        info!(
            "Starting WAV recorder ({}Hz, {} channels, {}ms timeslice)",
            self.format.sample_rate,
            self.format.channels,
            self.timeslice.as_millis()
        );

        self.task = Some(tokio::spawn(encode(
            frames,
            self.format,
            self.timeslice,
            header,
            event_tx,
            stop_rx,
        )));
        self.stop_tx = Some(stop_tx);
        self.state = RecorderState::Recording;

        Ok(event_rx)
    }

    fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            debug!("Stopping WAV recorder");
            let _ = stop_tx.send(());
        }
        self.state = RecorderState::Inactive;
    }

    fn state(&self) -> RecorderState {
        self.state
    }

    fn seal(&self, recording: &mut [u8]) {
        if !seal_wav_sizes(recording) {
            warn!("Recording has no WAV data chunk; sizes left as streamed");
        }
    }
}

impl Drop for WavRecorder {
    fn drop(&mut self) {
        self.stop();
        // The encoder exits on its own once stopped; detach it
        self.task.take();
    }
}

async fn encode(
    mut frames: mpsc::Receiver<AudioFrame>,
    format: StreamFormat,
    timeslice: Duration,
    header: Vec<u8>,
    events: mpsc::Sender<RecorderEvent>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    if events.send(RecorderEvent::DataAvailable(header)).await.is_err() {
        return;
    }

    let mut pending: Vec<u8> = Vec::new();
    let mut frames_open = true;
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + timeslice, timeslice);

    loop {
        tokio::select! {
            _ = &mut stop_rx => break,
            frame = frames.recv(), if frames_open => match frame {
                Some(frame) => {
                    if frame.sample_rate != format.sample_rate || frame.channels != format.channels {
                        let _ = events
                            .send(RecorderEvent::Error(format!(
                                "frame format {}Hz/{}ch does not match stream format",
                                frame.sample_rate, frame.channels
                            )))
                            .await;
                        continue;
                    }
                    pending.extend(frame.samples.iter().flat_map(|s| s.to_le_bytes()));
                }
                None => {
                    // Source tracks stopped; keep the timeslice cadence until stop()
                    debug!("Recorder source closed");
                    frames_open = false;
                }
            },
            _ = ticker.tick() => {
                let fragment = std::mem::take(&mut pending);
                if events.send(RecorderEvent::DataAvailable(fragment)).await.is_err() {
                    return;
                }
            }
        }
    }

    // Drain whatever the device delivered before stop
    while let Ok(frame) = frames.try_recv() {
        if frame.sample_rate == format.sample_rate && frame.channels == format.channels {
            pending.extend(frame.samples.iter().flat_map(|s| s.to_le_bytes()));
        }
    }

    if events.send(RecorderEvent::DataAvailable(pending)).await.is_err() {
        warn!("Recorder consumer went away before the final fragment");
        return;
    }
    let _ = events.send(RecorderEvent::Stopped).await;
    debug!("WAV recorder finalized");
}
