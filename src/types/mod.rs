//! Shared data structures for the adaptive wait engine
//!
//! - `ExecutionProfile` / `ProfileRegistry`: named tuning presets
//! - `ContextSnapshot`: normalised system health for one invocation
//! - `Speed`, `WaitRequest`, `Detector`: what the caller asks for
//! - `WaitDecision`: the computed interval and everything that shaped it

mod context;
mod decision;
mod profile;
mod request;

pub use context::*;
pub use decision::*;
pub use profile::*;
pub use request::*;
