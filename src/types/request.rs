//! Caller-facing request types: what to wait for and how fast

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::str::FromStr;

use crate::config::defaults::MAX_REQUEST_SECS;
use crate::engine::WaitError;

// ============================================================================
// Speed
// ============================================================================

/// Named speed presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedPreset {
    Slow,
    #[default]
    Normal,
    Fast,
    Ultra,
}

impl std::fmt::Display for SpeedPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeedPreset::Slow => write!(f, "slow"),
            SpeedPreset::Normal => write!(f, "normal"),
            SpeedPreset::Fast => write!(f, "fast"),
            SpeedPreset::Ultra => write!(f, "ultra"),
        }
    }
}

/// Speed descriptor: a preset or an explicit multiplier.
///
/// Smart mode is a separate flag on the wait options, not a variant here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speed {
    Preset(SpeedPreset),
    Value(f64),
}

impl Default for Speed {
    fn default() -> Self {
        Speed::Preset(SpeedPreset::Normal)
    }
}

impl From<SpeedPreset> for Speed {
    fn from(preset: SpeedPreset) -> Self {
        Speed::Preset(preset)
    }
}

impl From<f64> for Speed {
    fn from(value: f64) -> Self {
        Speed::Value(value)
    }
}

/// Parsing never fails: numbers become `Value`, unknown names become `Normal`.
impl FromStr for Speed {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(value) = s.parse::<f64>() {
            return Ok(Speed::Value(value));
        }
        let preset = match s.to_ascii_lowercase().as_str() {
            "slow" => SpeedPreset::Slow,
            "fast" => SpeedPreset::Fast,
            "ultra" => SpeedPreset::Ultra,
            _ => SpeedPreset::Normal,
        };
        Ok(Speed::Preset(preset))
    }
}

impl std::fmt::Display for Speed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Speed::Preset(p) => write!(f, "{p}"),
            Speed::Value(v) => write!(f, "{v}"),
        }
    }
}

// ============================================================================
// Conditions
// ============================================================================

/// Anything that can be polled for a boolean outcome.
///
/// Closures implement this automatically; a screen/OCR backend implements it
/// to plug into the same polling loop.
pub trait Detector: Send {
    fn detect(&mut self) -> bool;
}

impl<F> Detector for F
where
    F: FnMut() -> bool + Send,
{
    fn detect(&mut self) -> bool {
        self()
    }
}

// ============================================================================
// Wait Request
// ============================================================================

/// What the caller wants to wait for.
pub enum WaitRequest {
    /// Adaptive wait derived from a requested time (seconds).
    Duration(f64),
    /// Minimal adaptive wait with no requested time.
    Auto,
    /// Poll `condition` until it holds or `timeout` seconds elapse.
    Condition {
        condition: Box<dyn Detector>,
        timeout: f64,
    },
}

impl WaitRequest {
    pub fn duration(seconds: f64) -> Self {
        WaitRequest::Duration(seconds)
    }

    pub fn condition<D>(condition: D, timeout: f64) -> Self
    where
        D: Detector + 'static,
    {
        WaitRequest::Condition {
            condition: Box::new(condition),
            timeout,
        }
    }

    /// Serializable description of the request, for reports and logs.
    pub fn requested(&self) -> RequestedInput {
        match self {
            WaitRequest::Duration(seconds) => RequestedInput::Duration { seconds: *seconds },
            WaitRequest::Auto => RequestedInput::Auto,
            WaitRequest::Condition { timeout, .. } => RequestedInput::Condition { timeout: *timeout },
        }
    }

    /// Reject requests that cannot be turned into a wait.
    ///
    /// Runs before any context is sampled.
    pub fn validate(&self) -> Result<(), WaitError> {
        match self {
            WaitRequest::Duration(seconds) if !seconds.is_finite() || *seconds < 0.0 => {
                Err(WaitError::InvalidRequest(format!(
                    "duration must be a finite, non-negative number of seconds, got {seconds}"
                )))
            }
            WaitRequest::Duration(seconds) if *seconds > MAX_REQUEST_SECS => {
                Err(WaitError::InvalidRequest(format!(
                    "duration of {seconds}s exceeds the {MAX_REQUEST_SECS}s maximum"
                )))
            }
            WaitRequest::Condition { timeout, .. } if timeout.is_nan() => Err(
                WaitError::InvalidRequest("condition timeout must be a number".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for WaitRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaitRequest::Duration(seconds) => f.debug_tuple("Duration").field(seconds).finish(),
            WaitRequest::Auto => write!(f, "Auto"),
            WaitRequest::Condition { timeout, .. } => f
                .debug_struct("Condition")
                .field("timeout", timeout)
                .finish_non_exhaustive(),
        }
    }
}

/// Parses a textual directive: `auto`, or a number of seconds.
impl FromStr for WaitRequest {
    type Err = WaitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(WaitRequest::Auto);
        }
        let seconds = s.parse::<f64>().map_err(|_| {
            WaitError::InvalidRequest(format!("'{s}' is neither a number of seconds nor 'auto'"))
        })?;
        let request = WaitRequest::Duration(seconds);
        request.validate()?;
        Ok(request)
    }
}

/// The requested input as it appears in reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RequestedInput {
    Duration { seconds: f64 },
    Auto,
    Condition { timeout: f64 },
}

impl RequestedInput {
    /// Requested time for duration mode, if any.
    pub fn requested_time(&self) -> Option<f64> {
        match self {
            RequestedInput::Duration { seconds } => Some(*seconds),
            _ => None,
        }
    }
}

impl std::fmt::Display for RequestedInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestedInput::Duration { seconds } => write!(f, "{seconds:.3}s"),
            RequestedInput::Auto => write!(f, "auto"),
            RequestedInput::Condition { timeout } => write!(f, "condition (timeout {timeout:.3}s)"),
        }
    }
}
