//! Wait engine errors
//!
//! Only caller mistakes and interruptions surface here. Sensor and
//! persistence faults are recovered inside the engine, and a condition
//! timeout is a normal `false` result.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    /// The request cannot be turned into a wait (usage error).
    #[error("invalid wait request: {0}")]
    InvalidRequest(String),

    /// The wait was cancelled while in progress.
    ///
    /// The interrupted execution has already been recorded as a failed
    /// learning sample.
    #[error("wait interrupted after {elapsed:?} (profile '{profile}')")]
    Interrupted { profile: String, elapsed: Duration },

    /// A blocking wrapper could not build its runtime.
    #[error("failed to start wait runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

impl WaitError {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, WaitError::Interrupted { .. })
    }
}
