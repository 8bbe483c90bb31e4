//! Adaptive Learning - per-profile bias calibrated by exponential moving average
//!
//! Every execution feeds an observed/expected ratio back into the bias of the
//! profile it ran under. The bias then scales the next computed interval.
//!
//! Storage is pluggable through [`LearningStore`]:
//! - `InMemoryLearningStore`: process-lifetime store for tests and ephemeral runs
//! - `JsonFileLearningStore`: whole-file JSON persistence across runs
//!
//! Each store owns the lock that serializes its read-modify-write cycle; all
//! callers in the process share one store instance through an `Arc`.

mod json_store;

pub use json_store::JsonFileLearningStore;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use crate::config::defaults::{
    INITIAL_BIAS, LEARNING_ALPHA, LEARNING_FAILURE_PENALTY, MAX_BIAS, MIN_BIAS,
};

// ============================================================================
// State
// ============================================================================

/// Learned calibration for one profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LearningState {
    pub bias: f64,
    pub samples: u64,
    pub timeouts: u64,
}

impl Default for LearningState {
    fn default() -> Self {
        Self {
            bias: INITIAL_BIAS,
            samples: 0,
            timeouts: 0,
        }
    }
}

/// One observed execution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearningSample {
    pub success: bool,
    /// Planned duration (seconds).
    pub expected: f64,
    /// Observed duration (seconds).
    pub actual: f64,
}

impl LearningSample {
    pub fn success(expected: f64, actual: f64) -> Self {
        Self {
            success: true,
            expected,
            actual,
        }
    }

    pub fn failure(expected: f64, actual: f64) -> Self {
        Self {
            success: false,
            expected,
            actual,
        }
    }

    /// Observed/expected ratio, 1.0 when there is nothing to compare against.
    pub fn ratio(&self) -> f64 {
        let ratio = if self.expected > 0.0 {
            self.actual / self.expected
        } else {
            1.0
        };
        if ratio.is_finite() {
            ratio
        } else {
            1.0
        }
    }
}

impl LearningState {
    /// Fold one sample into the state.
    ///
    /// `bias' = bias·(1−α) + ratio·α`, ×1.05 on failure, clamped to
    /// `[0.5, 2.5]` and rounded to four decimals.
    pub fn apply(&mut self, sample: &LearningSample) {
        self.samples += 1;
        if !sample.success {
            self.timeouts += 1;
        }

        let mut bias = self.bias * (1.0 - LEARNING_ALPHA) + sample.ratio() * LEARNING_ALPHA;
        if !sample.success {
            bias *= LEARNING_FAILURE_PENALTY;
        }
        self.bias = round4(bias.clamp(MIN_BIAS, MAX_BIAS));
    }
}

/// The full persisted mapping: `{"profiles": {name: state}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningBook {
    #[serde(default)]
    pub profiles: BTreeMap<String, LearningState>,
}

impl LearningBook {
    pub fn bias(&self, profile: &str) -> f64 {
        self.profiles
            .get(profile)
            .map_or(INITIAL_BIAS, |s| s.bias)
    }

    /// Bring externally supplied biases back into `[0.5, 2.5]`.
    ///
    /// Non-finite values reset to the neutral 1.0.
    pub fn normalize(&mut self) {
        for state in self.profiles.values_mut() {
            state.bias = if state.bias.is_finite() {
                round4(state.bias.clamp(MIN_BIAS, MAX_BIAS))
            } else {
                INITIAL_BIAS
            };
        }
    }

    /// Apply a sample, creating the profile entry on first use.
    pub fn record(&mut self, profile: &str, sample: &LearningSample) -> LearningState {
        let state = self.profiles.entry(profile.to_string()).or_default();
        state.apply(sample);
        *state
    }
}

// ============================================================================
// Store Trait
// ============================================================================

/// Trait for pluggable learning backends.
///
/// Contract: `update` and `reset` perform their read-modify-write (and any
/// persistence) while holding the store's single lock, so concurrent callers
/// sharing one instance never lose an update.
pub trait LearningStore: Send + Sync {
    /// Current bias for `profile`; 1.0 if the profile has never been seen.
    fn bias(&self, profile: &str) -> f64;

    /// Full state for `profile`, if any sample was ever recorded.
    fn state(&self, profile: &str) -> Option<LearningState>;

    /// Record one execution outcome and return the new state.
    ///
    /// On a persistence error the in-memory state has already been updated.
    fn update(&self, profile: &str, sample: &LearningSample) -> Result<LearningState, LearningError>;

    /// Forget everything learned for `profile`. Returns whether it existed.
    fn reset(&self, profile: &str) -> Result<bool, LearningError>;

    /// Copy of the whole mapping.
    fn snapshot(&self) -> LearningBook;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Learning store errors
#[derive(Debug, thiserror::Error)]
pub enum LearningError {
    #[error("learning store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("learning store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ============================================================================
// In-Memory Store
// ============================================================================

/// In-memory learning store.
///
/// Thread-safe via `Mutex`. Not durable - data lost on exit.
#[derive(Debug, Default)]
pub struct InMemoryLearningStore {
    book: Mutex<LearningBook>,
}

impl InMemoryLearningStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing mapping.
    pub fn with_book(mut book: LearningBook) -> Self {
        book.normalize();
        Self {
            book: Mutex::new(book),
        }
    }
}

impl LearningStore for InMemoryLearningStore {
    fn bias(&self, profile: &str) -> f64 {
        self.book
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .bias(profile)
    }

    fn state(&self, profile: &str) -> Option<LearningState> {
        self.book
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .profiles
            .get(profile)
            .copied()
    }

    fn update(&self, profile: &str, sample: &LearningSample) -> Result<LearningState, LearningError> {
        let mut book = self.book.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(book.record(profile, sample))
    }

    fn reset(&self, profile: &str) -> Result<bool, LearningError> {
        let mut book = self.book.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(book.profiles.remove(profile).is_some())
    }

    fn snapshot(&self) -> LearningBook {
        self.book
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
