//! Context snapshot: normalised system health captured once per invocation

use serde::{Deserialize, Serialize};

use crate::config::defaults::{MAX_CONTEXT_SCORE, NEUTRAL_CONTEXT_SCORE};

/// Point-in-time system context.
///
/// Both scores live in `[0, 10]`, higher meaning a healthier system.
/// `wifi_score` is `None` when no network hint was supplied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub cpu_score: f64,
    pub wifi_score: Option<f64>,
}

impl ContextSnapshot {
    /// Build a snapshot, clamping both scores into `[0, 10]`.
    ///
    /// Non-finite inputs become the neutral score.
    pub fn new(cpu_score: f64, wifi_score: Option<f64>) -> Self {
        Self {
            cpu_score: normalize_score(cpu_score),
            wifi_score: wifi_score.map(normalize_score),
        }
    }

    /// Snapshot used when every sensor failed.
    pub fn neutral() -> Self {
        Self {
            cpu_score: NEUTRAL_CONTEXT_SCORE,
            wifi_score: None,
        }
    }

    /// Wi-Fi score, or the neutral 5.0 when absent.
    pub fn wifi_or_neutral(&self) -> f64 {
        self.wifi_score.unwrap_or(NEUTRAL_CONTEXT_SCORE)
    }

    /// Combined risk score used when network context is present.
    pub fn combined_risk(&self) -> f64 {
        (self.cpu_score + self.wifi_or_neutral()) / 2.0
    }
}

impl Default for ContextSnapshot {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Clamp a raw score into `[0, 10]`, mapping NaN/inf to neutral.
pub fn normalize_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, MAX_CONTEXT_SCORE)
    } else {
        NEUTRAL_CONTEXT_SCORE
    }
}
