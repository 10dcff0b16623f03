use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

use super::stream::MediaStream;

/// What the panel's audio element is bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlaybackSource {
    Empty,
    /// Live monitor of a capture stream
    Live { stream_id: String },
    /// A recorded artifact
    Url { url: String },
}

/// The panel's audio output element
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackElement {
    source: PlaybackSource,
    /// Number of times a new URL source was loaded
    loads: usize,
}

impl Default for PlaybackElement {
    fn default() -> Self {
        Self {
            source: PlaybackSource::Empty,
            loads: 0,
        }
    }
}

impl PlaybackElement {
    pub fn source(&self) -> &PlaybackSource {
        &self.source
    }

    pub fn loads(&self) -> usize {
        self.loads
    }

    pub fn attach_stream(&mut self, stream: &MediaStream) {
        self.source = PlaybackSource::Live {
            stream_id: stream.id().to_string(),
        };
    }

    /// Detach any live stream and load `url`
    pub fn load_url(&mut self, url: impl Into<String>) {
        self.source = PlaybackSource::Url { url: url.into() };
        self.loads += 1;
    }

    pub fn clear(&mut self) {
        self.source = PlaybackSource::Empty;
    }
}

/// Bytes behind a playable URL
#[derive(Debug, Clone)]
pub struct StoredArtifact {
    pub bytes: Arc<Vec<u8>>,
    pub mime_type: String,
}

/// Registry of playable URLs for recorded blobs. Cheap to clone; all clones
/// share one registry.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    base_path: String,
    entries: Arc<RwLock<HashMap<String, StoredArtifact>>>,
}

impl Default for ArtifactStore {
    fn default() -> Self {
        Self::new("/artifacts")
    }
}

impl ArtifactStore {
    /// URLs are issued as `{base_path}/{id}`
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into().trim_end_matches('/').to_string(),
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn create_object_url(&self, bytes: Arc<Vec<u8>>, mime_type: &str) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let url = format!("{}/{}", self.base_path, id);

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            id,
            StoredArtifact {
                bytes,
                mime_type: mime_type.to_string(),
            },
        );

        debug!("Created artifact URL {}", url);
        url
    }

    /// Forget the blob behind `url`; unknown URLs are ignored
    pub fn revoke(&self, url: &str) -> bool {
        let Some(id) = self.id_from_url(url) else {
            return false;
        };
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let removed = entries.remove(id).is_some();
        if removed {
            debug!("Revoked artifact URL {}", url);
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<StoredArtifact> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(id).cloned()
    }

    pub fn resolve(&self, url: &str) -> Option<StoredArtifact> {
        self.id_from_url(url).and_then(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn id_from_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.base_path.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|id| !id.is_empty())
    }
}
