//! System-wide default constants.
//!
//! Centralises the tuning numbers used by the wait computer, the learning
//! store and the context provider. Grouped by subsystem for easy discovery.

// ============================================================================
// Wait Computer
// ============================================================================

/// Lower bound on `10 - risk` before dividing by the speed multiplier.
pub const FACTOR_EPSILON: f64 = 0.2;

/// Smallest interval the engine will ever sleep in duration mode (seconds).
pub const MIN_WAIT_SECS: f64 = 0.05;

/// Poll interval bounds for condition mode (seconds).
pub const MIN_POLL_SECS: f64 = 0.05;
pub const MAX_POLL_SECS: f64 = 0.5;

/// Upper bound of a normalised context score.
pub const MAX_CONTEXT_SCORE: f64 = 10.0;

/// Score reported when a sensor is unavailable or fails.
pub const NEUTRAL_CONTEXT_SCORE: f64 = 5.0;

/// Largest requested duration accepted (seconds, roughly 31 years).
///
/// Keeps the scaled interval representable as a `Duration`.
pub const MAX_REQUEST_SECS: f64 = 1.0e9;

// ============================================================================
// Speed Resolver
// ============================================================================

pub const SPEED_SLOW: f64 = 0.5;
pub const SPEED_NORMAL: f64 = 1.5;
pub const SPEED_FAST: f64 = 3.0;
pub const SPEED_ULTRA: f64 = 5.0;

/// Clamp range for the smart-mode multiplier.
pub const SMART_SPEED_MIN: f64 = 0.5;
pub const SMART_SPEED_MAX: f64 = 5.0;

// ============================================================================
// Adaptive Learning
// ============================================================================

/// EMA smoothing factor for bias updates.
pub const LEARNING_ALPHA: f64 = 0.1;

/// Multiplicative penalty applied to the bias after a failed execution.
pub const LEARNING_FAILURE_PENALTY: f64 = 1.05;

/// Bias clamp range.
pub const MIN_BIAS: f64 = 0.5;
pub const MAX_BIAS: f64 = 2.5;

/// Bias assigned to a profile the first time it is seen.
pub const INITIAL_BIAS: f64 = 1.0;

/// Learning store file name, relative to the home directory.
pub const LEARNING_FILE_NAME: &str = ".nano_wait_learning.json";

// ============================================================================
// Usage Log
// ============================================================================

/// JSONL usage log file name, relative to the home directory.
pub const USAGE_FILE_NAME: &str = ".nano_wait_usage.jsonl";

/// Anonymous id file name, relative to the home directory.
pub const USAGE_ID_FILE_NAME: &str = ".nano_wait_uid";

/// Environment switch; `0` disables the usage log.
pub const USAGE_ENV_VAR: &str = "NANO_WAIT_TELEMETRY";

// ============================================================================
// Configuration
// ============================================================================

/// Environment variable pointing at a TOML config file.
pub const CONFIG_ENV_VAR: &str = "NANO_WAIT_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "nano_wait.toml";
