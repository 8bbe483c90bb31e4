//! Context Provider - normalised system health for wait decisions
//!
//! The engine never reads sensors directly. It asks a [`ContextProvider`]
//! for a [`ContextSnapshot`] once per invocation:
//! - `SystemContext`: Linux sensors (load average, memory, Wi-Fi link quality)
//! - `StaticContext`: fixed scores for tests and deterministic runs
//!
//! Providers must never fail; any sensor fault degrades to the neutral 5.0.

mod system;

pub use system::SystemContext;

use crate::types::ContextSnapshot;

/// Source of context snapshots.
///
/// Implementations must be thread-safe (Send + Sync) so one provider can be
/// shared by every task in a wait pool.
pub trait ContextProvider: Send + Sync {
    /// Capture a snapshot.
    ///
    /// `wifi_hint` names the network (SSID or interface) of interest. When
    /// it is `None` the snapshot carries no Wi-Fi score.
    fn snapshot(&self, wifi_hint: Option<&str>) -> ContextSnapshot;

    /// Provider name for logging
    fn provider_name(&self) -> &'static str;
}

/// Provider that always returns the same scores.
#[derive(Debug, Clone, Copy)]
pub struct StaticContext {
    cpu_score: f64,
    wifi_score: f64,
}

impl StaticContext {
    pub fn new(cpu_score: f64, wifi_score: f64) -> Self {
        Self {
            cpu_score,
            wifi_score,
        }
    }
}

impl Default for StaticContext {
    fn default() -> Self {
        let neutral = ContextSnapshot::neutral();
        Self::new(neutral.cpu_score, neutral.wifi_or_neutral())
    }
}

impl ContextProvider for StaticContext {
    fn snapshot(&self, wifi_hint: Option<&str>) -> ContextSnapshot {
        ContextSnapshot::new(self.cpu_score, wifi_hint.map(|_| self.wifi_score))
    }

    fn provider_name(&self) -> &'static str {
        "Static"
    }
}
