use thiserror::Error;

/// Device and recorder errors, worded for display in the capture panel
#[derive(Error, Debug)]
pub enum MediaError {
    /// The requested kind of media cannot be captured
    #[error("Requested media is not supported: {0}")]
    NotSupported(String),

    /// No audio input device found
    #[error("No audio input device found")]
    DeviceNotFound,

    /// The user or platform refused access
    #[error("Permission denied: {0}")]
    NotAllowed(String),

    /// Device exists but could not be opened
    #[error("Could not start audio source: {0}")]
    NotReadable(String),

    /// Recorder could not be created or started
    #[error("Recorder error: {0}")]
    Recorder(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type MediaResult<T> = Result<T, MediaError>;
