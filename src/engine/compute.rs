//! Wait Computer - pure interval math
//!
//! ```text
//! risk     = (cpu + wifi_or_5) / 2        (cpu alone without network context)
//! factor   = max(0.2, 10 - risk) / speed
//! raw      = requested / factor           (factor itself for an auto wait)
//! resolved = round_ms(max(0.05, min(raw, requested_or_raw)))
//! final    = resolved × aggressiveness × bias
//! ```
//!
//! A higher factor means the system can proceed faster, so the wait shrinks.

use crate::config::defaults::{
    FACTOR_EPSILON, MAX_CONTEXT_SCORE, MAX_POLL_SECS, MIN_POLL_SECS, MIN_WAIT_SECS,
};
use crate::types::{ContextSnapshot, ExecutionProfile};

/// Result of clamping a raw interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampedInterval {
    /// Interval before clamping.
    pub raw: f64,
    /// Interval after clamping (seconds).
    pub interval: f64,
    pub min_floor_applied: bool,
    pub max_cap_applied: bool,
}

/// Risk score: combined with Wi-Fi when network context was captured.
pub fn risk(context: &ContextSnapshot) -> f64 {
    match context.wifi_score {
        Some(_) => context.combined_risk(),
        None => context.cpu_score,
    }
}

/// "Go-fast" factor for a context and a positive speed multiplier.
pub fn compute_factor(context: &ContextSnapshot, speed: f64) -> f64 {
    (MAX_CONTEXT_SCORE - risk(context)).max(FACTOR_EPSILON) / speed
}

/// Duration-mode interval.
///
/// The cap is the requested time itself (or the raw value for an auto
/// wait), and the 0.05 s floor wins over the cap.
pub fn duration_interval(requested: Option<f64>, factor: f64) -> ClampedInterval {
    let raw = match requested {
        Some(t) => t / factor,
        None => factor,
    };
    let cap = requested.unwrap_or(raw);
    let interval = round_ms(raw.min(cap).max(MIN_WAIT_SECS));

    ClampedInterval {
        raw,
        interval,
        min_floor_applied: raw < MIN_WAIT_SECS,
        max_cap_applied: requested.is_some_and(|t| raw > t),
    }
}

/// Condition-mode poll interval, bounded to `[0.05, 0.5]`.
pub fn poll_interval(factor: f64) -> ClampedInterval {
    let raw = 1.0 / factor;
    ClampedInterval {
        raw,
        interval: round_ms(raw.clamp(MIN_POLL_SECS, MAX_POLL_SECS)),
        min_floor_applied: raw < MIN_POLL_SECS,
        max_cap_applied: raw > MAX_POLL_SECS,
    }
}

/// Scale a clamped interval by the profile's aggressiveness and the learned bias.
pub fn apply_profile_and_bias(interval: f64, profile: &ExecutionProfile, bias: f64) -> f64 {
    round4(interval * profile.aggressiveness * bias)
}

fn round_ms(value: f64) -> f64 {
    (value * 1_000.0).round() / 1_000.0
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProfileRegistry;

    #[test]
    fn test_factor_with_and_without_network() {
        // risk = (6 + 4) / 2 = 5 → factor = 5 / 2.5
        let with_wifi = ContextSnapshot::new(6.0, Some(4.0));
        assert_eq!(compute_factor(&with_wifi, 2.5), 2.0);

        // cpu alone: 10 - 6 = 4
        let cpu_only = ContextSnapshot::new(6.0, None);
        assert_eq!(compute_factor(&cpu_only, 1.0), 4.0);
    }

    #[test]
    fn test_factor_epsilon_on_perfect_context() {
        let ctx = ContextSnapshot::new(10.0, Some(10.0));
        assert_eq!(compute_factor(&ctx, 1.0), FACTOR_EPSILON);
    }

    #[test]
    fn test_requested_time_caps_the_interval() {
        // factor 0.2 → raw 20.0, capped at the requested 4.0
        let result = duration_interval(Some(4.0), 0.2);
        assert_eq!(result.interval, 4.0);
        assert!(result.max_cap_applied);
        assert!(!result.min_floor_applied);
    }

    #[test]
    fn test_floor_applied() {
        // worst context, ultra speed: factor = 10 / 5 = 2 → raw 0.04
        let ctx = ContextSnapshot::new(0.0, Some(0.0));
        let factor = compute_factor(&ctx, 5.0);
        let result = duration_interval(Some(0.08), factor);
        assert_eq!(result.interval, 0.05);
        assert!(result.min_floor_applied);
        assert!(!result.max_cap_applied);
    }

    #[test]
    fn test_unclamped_interval_is_rounded_to_ms() {
        let result = duration_interval(Some(1.0), 3.0);
        assert_eq!(result.interval, 0.333);
        assert!(!result.min_floor_applied && !result.max_cap_applied);
    }

    #[test]
    fn test_auto_wait_uses_factor() {
        let result = duration_interval(None, 1.25);
        assert_eq!(result.interval, 1.25);
        assert!(!result.max_cap_applied);
    }

    #[test]
    fn test_interval_within_bounds_for_all_contexts() {
        let speeds = [0.1, 0.5, 1.5, 3.0, 5.0, 42.0];
        let requested = [0.05, 0.3, 1.0, 4.0, 60.0];
        for cpu in 0..=10 {
            for wifi in 0..=10 {
                let ctx = ContextSnapshot::new(f64::from(cpu), Some(f64::from(wifi)));
                for speed in speeds {
                    for t in requested {
                        let result = duration_interval(Some(t), compute_factor(&ctx, speed));
                        assert!(
                            result.interval >= 0.05 && result.interval <= t,
                            "cpu={cpu} wifi={wifi} speed={speed} t={t} → {}",
                            result.interval
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_poll_interval_bounds() {
        assert_eq!(poll_interval(0.2).interval, 0.5);
        assert!(poll_interval(0.2).max_cap_applied);
        assert_eq!(poll_interval(100.0).interval, 0.05);
        assert!(poll_interval(100.0).min_floor_applied);
        assert_eq!(poll_interval(4.0).interval, 0.25);
    }

    #[test]
    fn test_profile_and_bias_scaling() {
        let rpa = ProfileRegistry.get("rpa");
        assert_eq!(apply_profile_and_bias(0.5, rpa, 1.1), 1.1);
        let ci = ProfileRegistry.get("ci");
        assert_eq!(apply_profile_and_bias(0.5, ci, 1.0), 0.25);
    }
}
