//! Execution profiles: named tuning presets for the wait engine

use serde::Serialize;

/// Reserved profile name used for bookkeeping when the caller names none.
pub const AUTO_PROFILE: &str = "auto";

/// Profile used when a lookup misses.
pub const DEFAULT_PROFILE: &str = "default";

/// A named bundle of tuning constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExecutionProfile {
    pub name: &'static str,
    /// Multiplier applied to every computed interval.
    pub aggressiveness: f64,
    /// Permissiveness to transient failures, in `[0, 1]`.
    pub tolerance: f64,
    /// Base polling cadence (seconds).
    pub poll_interval: f64,
    /// Log every decision at `info` level.
    pub verbose: bool,
}

const CI: ExecutionProfile = ExecutionProfile {
    name: "ci",
    aggressiveness: 0.5,
    tolerance: 0.9,
    poll_interval: 0.05,
    verbose: true,
};

const TESTING: ExecutionProfile = ExecutionProfile {
    name: "testing",
    aggressiveness: 1.0,
    tolerance: 0.7,
    poll_interval: 0.1,
    verbose: true,
};

const RPA: ExecutionProfile = ExecutionProfile {
    name: "rpa",
    aggressiveness: 2.0,
    tolerance: 0.5,
    poll_interval: 0.2,
    verbose: false,
};

const DEFAULT: ExecutionProfile = ExecutionProfile {
    name: DEFAULT_PROFILE,
    aggressiveness: 1.0,
    tolerance: 0.8,
    poll_interval: 0.1,
    verbose: false,
};

const AUTO: ExecutionProfile = ExecutionProfile {
    name: AUTO_PROFILE,
    aggressiveness: 1.0,
    tolerance: 0.8,
    poll_interval: 0.1,
    verbose: false,
};

static PROFILES: [ExecutionProfile; 5] = [CI, TESTING, RPA, DEFAULT, AUTO];

/// Read-only registry of the built-in profiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileRegistry;

impl ProfileRegistry {
    /// Look up a profile by name. Unknown names resolve to `default`.
    pub fn get(&self, name: &str) -> &'static ExecutionProfile {
        PROFILES
            .iter()
            .find(|p| p.name == name)
            .unwrap_or(&PROFILES[3])
    }

    /// Resolve an optional caller-supplied name; `None` selects `auto`.
    pub fn resolve(&self, name: Option<&str>) -> &'static ExecutionProfile {
        self.get(name.unwrap_or(AUTO_PROFILE))
    }

    /// Whether `name` is one of the built-in profiles.
    pub fn contains(&self, name: &str) -> bool {
        PROFILES.iter().any(|p| p.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        PROFILES.iter().map(|p| p.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_profiles() {
        let registry = ProfileRegistry;
        assert_eq!(registry.get("rpa").aggressiveness, 2.0);
        assert_eq!(registry.get("ci").poll_interval, 0.05);
        assert!(registry.get("testing").verbose);
    }

    #[test]
    fn test_unknown_profile_falls_back_to_default() {
        let registry = ProfileRegistry;
        assert_eq!(registry.get("does-not-exist").name, DEFAULT_PROFILE);
    }

    #[test]
    fn test_missing_name_resolves_to_auto() {
        let registry = ProfileRegistry;
        let profile = registry.resolve(None);
        assert_eq!(profile.name, AUTO_PROFILE);
        assert_ne!(profile.name, DEFAULT_PROFILE);
    }

    #[test]
    fn test_profile_invariants() {
        let registry = ProfileRegistry;
        for name in registry.names() {
            let p = registry.get(name);
            assert!(p.aggressiveness > 0.0, "{name}");
            assert!((0.0..=1.0).contains(&p.tolerance), "{name}");
            assert!(p.poll_interval > 0.0, "{name}");
        }
    }
}
