use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Capture lifecycle. Errors are reported beside the state, never as one.
///
/// ```text
/// Idle --start--> Requesting --stream--> Recording --stop--> Stopping --finalized--> Idle
///                     \--failure--> Idle
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    #[default]
    Idle,
    /// Waiting for the host and the device stream
    Requesting,
    Recording,
    /// Recorder asked to finalize
    Stopping,
}

impl CaptureState {
    pub fn can_start(&self) -> bool {
        matches!(self, CaptureState::Idle)
    }

    pub fn can_stop(&self) -> bool {
        matches!(self, CaptureState::Recording)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, CaptureState::Recording)
    }

    pub fn name(&self) -> &'static str {
        match self {
            CaptureState::Idle => "idle",
            CaptureState::Requesting => "requesting",
            CaptureState::Recording => "recording",
            CaptureState::Stopping => "stopping",
        }
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Current capture state, shared with the guard of an in-flight transition
#[derive(Debug, Clone, Default)]
pub(crate) struct StateCell(Arc<Mutex<CaptureState>>);

impl StateCell {
    pub fn get(&self) -> CaptureState {
        *self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set(&self, state: CaptureState) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    /// Enter a transient state. Unless the guard is completed, dropping it
    /// (including when the owning future is cancelled) falls back to `Idle`.
    pub fn begin(&self, transient: CaptureState) -> Transition {
        self.set(transient);
        Transition {
            cell: self.clone(),
            completed: false,
        }
    }
}

#[must_use = "dropping the transition resets the state to idle"]
pub(crate) struct Transition {
    cell: StateCell,
    completed: bool,
}

impl Transition {
    pub fn complete(mut self, next: CaptureState) {
        self.cell.set(next);
        self.completed = true;
    }
}

impl Drop for Transition {
    fn drop(&mut self) {
        if !self.completed {
            self.cell.set(CaptureState::Idle);
        }
    }
}
