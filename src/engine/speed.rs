//! Speed Resolver - descriptor or live context to a positive multiplier

use crate::config::defaults::{
    SMART_SPEED_MAX, SMART_SPEED_MIN, SPEED_FAST, SPEED_NORMAL, SPEED_SLOW, SPEED_ULTRA,
};
use crate::types::{ContextSnapshot, Speed, SpeedPreset};

/// Multiplier for a preset.
pub fn preset_value(preset: SpeedPreset) -> f64 {
    match preset {
        SpeedPreset::Slow => SPEED_SLOW,
        SpeedPreset::Normal => SPEED_NORMAL,
        SpeedPreset::Fast => SPEED_FAST,
        SpeedPreset::Ultra => SPEED_ULTRA,
    }
}

/// Multiplier for a descriptor. Never fails.
///
/// Explicit values that are not finite and positive resolve as `normal`.
pub fn resolve_speed(speed: Speed) -> f64 {
    match speed {
        Speed::Preset(preset) => preset_value(preset),
        Speed::Value(v) if v.is_finite() && v > 0.0 => v,
        Speed::Value(_) => SPEED_NORMAL,
    }
}

/// Multiplier for a textual descriptor (`"ultra"`, `"2.5"`, ...).
pub fn resolve_descriptor(descriptor: &str) -> f64 {
    let speed = descriptor.parse::<Speed>().unwrap_or_default();
    resolve_speed(speed)
}

/// Smart-mode multiplier derived from context, in `[0.5, 5.0]`.
pub fn smart_speed(context: &ContextSnapshot) -> f64 {
    let risk = context.combined_risk();
    round2(risk.clamp(SMART_SPEED_MIN, SMART_SPEED_MAX))
}

/// Resolve the multiplier for one invocation.
///
/// `smart` ignores the descriptor entirely.
pub fn resolve(speed: Speed, smart: bool, context: &ContextSnapshot) -> f64 {
    if smart {
        smart_speed(context)
    } else {
        resolve_speed(speed)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_presets() {
        assert_eq!(resolve_descriptor("slow"), 0.5);
        assert_eq!(resolve_descriptor("normal"), 1.5);
        assert_eq!(resolve_descriptor("fast"), 3.0);
        assert_eq!(resolve_descriptor("ultra"), 5.0);
    }

    #[test]
    fn test_unknown_name_falls_back_to_normal() {
        assert_eq!(resolve_descriptor("unknown-name"), resolve_descriptor("normal"));
    }

    #[test]
    fn test_explicit_values() {
        assert_eq!(resolve_speed(Speed::Value(2.25)), 2.25);
        assert_eq!(resolve_speed(Speed::Value(0.0)), SPEED_NORMAL);
        assert_eq!(resolve_speed(Speed::Value(-3.0)), SPEED_NORMAL);
        assert_eq!(resolve_speed(Speed::Value(f64::NAN)), SPEED_NORMAL);
    }

    #[test]
    fn test_smart_speed_is_clamped() {
        assert_eq!(smart_speed(&ContextSnapshot::new(10.0, Some(10.0))), 5.0);
        assert_eq!(smart_speed(&ContextSnapshot::new(0.0, Some(0.0))), 0.5);
        // missing wifi counts as 5.0
        assert_eq!(smart_speed(&ContextSnapshot::new(2.0, None)), 3.5);
    }

    #[test]
    fn test_smart_ignores_descriptor() {
        let ctx = ContextSnapshot::new(4.0, Some(2.0));
        assert_eq!(resolve(Speed::Preset(SpeedPreset::Ultra), true, &ctx), 3.0);
        assert_eq!(resolve(Speed::Preset(SpeedPreset::Ultra), false, &ctx), 5.0);
    }
}
