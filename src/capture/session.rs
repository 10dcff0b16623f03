use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::logger::Logger;
use crate::media::{MediaRecorder, MediaStream, RecorderEvent};

/// Fragments gathered by the recorder pump, in arrival order
#[derive(Debug, Default, Clone)]
pub struct FragmentBuffer {
    pub fragments: Vec<Vec<u8>>,
    /// Data events with a non-empty payload
    pub data_events: usize,
    /// Data events that carried nothing
    pub empty_events: usize,
}

impl FragmentBuffer {
    pub fn push(&mut self, data: Vec<u8>) {
        if data.is_empty() {
            self.empty_events += 1;
        } else {
            self.data_events += 1;
            self.fragments.push(data);
        }
    }

    pub fn total_bytes(&self) -> usize {
        self.fragments.iter().map(Vec::len).sum()
    }

    pub fn assemble(self) -> Vec<u8> {
        self.fragments.concat()
    }
}

/// Collects recorder events until the recorder finalizes
pub(crate) async fn pump_fragments(
    mut events: mpsc::Receiver<RecorderEvent>,
    logger: Logger,
) -> FragmentBuffer {
    let mut buffer = FragmentBuffer::default();

    while let Some(event) = events.recv().await {
        match event {
            RecorderEvent::DataAvailable(data) => buffer.push(data),
            RecorderEvent::Error(message) => {
                logger.warn_with("Recorder reported an error", &[json!(message)])
            }
            RecorderEvent::Stopped => break,
        }
    }

    buffer
}

/// Resources of one recording attempt. Dropping a session stops every
/// device track.
pub(crate) struct CaptureSession {
    pub stream: MediaStream,
    pub recorder: Box<dyn MediaRecorder>,
    pub pump: Option<JoinHandle<FragmentBuffer>>,
}

impl CaptureSession {
    /// Stop the recorder pump and all tracks; returns tracks stopped now
    pub fn release(&mut self) -> usize {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        self.recorder.stop();
        self.stream.stop_all_tracks()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.release();
    }
}

/// A finished recording and its playable URL
#[derive(Debug, Clone)]
pub struct RecordedArtifact {
    pub bytes: Arc<Vec<u8>>,
    pub mime_type: String,
    pub url: String,
    pub fragment_count: usize,
    pub recorded_at: DateTime<Utc>,
}

impl RecordedArtifact {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            url: self.url.clone(),
            mime_type: self.mime_type.clone(),
            size_bytes: self.len(),
            fragment_count: self.fragment_count,
            recorded_at: self.recorded_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactSummary {
    pub url: String,
    pub mime_type: String,
    pub size_bytes: usize,
    pub fragment_count: usize,
    pub recorded_at: DateTime<Utc>,
}
