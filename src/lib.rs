//! nano-wait: adaptive wait primitive
//!
//! Replaces fixed sleeps with waits sized from live system context, a named
//! execution profile and a per-profile bias learned from past outcomes.
//!
//! ## Architecture
//!
//! - **Context Provider**: normalised CPU and Wi-Fi scores (0–10)
//! - **Wait Engine**: duration waits and condition polling
//! - **Pool Orchestrator**: concurrent, individually cancellable waits
//! - **Learning Store**: per-profile EMA bias, in memory or on disk
//! - **Telemetry / Explain**: opt-in observation of each decision
//!
//! ```no_run
//! use nano_wait::{WaitConfig, WaitEngine, WaitOptions, WaitRequest};
//!
//! # async fn demo() -> Result<(), nano_wait::WaitError> {
//! let engine = WaitEngine::from_config(&WaitConfig::load());
//! let options = WaitOptions::new().with_speed(3.0).with_profile("ci");
//! let outcome = engine.wait(WaitRequest::duration(2.0), &options).await?;
//! println!("slept {:?}", outcome.elapsed);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod engine;
pub mod explain;
pub mod learning;
pub mod telemetry;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, WaitConfig};

// Re-export commonly used types
pub use types::{
    ContextSnapshot, Detector, ExecutionProfile, ProfileRegistry, RequestedInput, Speed,
    SpeedPreset, WaitDecision, WaitRequest,
};

// Re-export engine
pub use engine::{CancelPredicate, PoolTask, WaitEngine, WaitError, WaitOptions, WaitOutcome, WaitResult};

// Re-export pluggable components
pub use context::{ContextProvider, StaticContext, SystemContext};
pub use explain::ExplainReport;
pub use learning::{
    InMemoryLearningStore, JsonFileLearningStore, LearningError, LearningSample, LearningState,
    LearningStore,
};
pub use telemetry::{TelemetryMessage, TelemetrySession, TelemetrySubscriber, TelemetrySummary};
