//! Wait decision: every input and output of one computed interval

use serde::{Deserialize, Serialize};

use super::{ContextSnapshot, RequestedInput, Speed};

/// The engine's decision for one invocation.
///
/// Condition-mode decisions describe the most recent poll interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitDecision {
    pub requested: RequestedInput,
    /// Descriptor supplied by the caller (ignored when `smart` is set).
    pub speed: Speed,
    pub smart: bool,
    /// Resolved speed multiplier.
    pub speed_value: f64,
    /// Profile name used for tuning and learning bookkeeping.
    pub profile: String,
    pub aggressiveness: f64,
    pub context: ContextSnapshot,
    pub factor: f64,
    /// Learned bias applied to the interval.
    pub bias: f64,
    /// Interval after floor/cap clamping, before profile and bias scaling.
    pub resolved_interval: f64,
    /// Interval actually slept.
    pub final_interval: f64,
    pub min_floor_applied: bool,
    pub max_cap_applied: bool,
}
