//! Telemetry Session - opt-in, per-invocation record of wait adjustments
//!
//! A session lives for exactly one engine invocation:
//!
//! ```text
//! Idle ──start()──> Started ──record()*──> Started ──stop()──> Stopped
//! ```
//!
//! Nothing is persisted. An optional [`TelemetrySubscriber`] receives each
//! event as it is recorded, followed by a final [`TelemetryMessage::Stop`]
//! carrying the summary; `Stop` is the subscriber's only termination signal.
//! A session never fails and never alters the engine's decision.

pub mod usage;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::trace;

use crate::types::ContextSnapshot;
use usage::UsageLog;

/// Usage event emitted once when a session starts.
pub const SESSION_START_EVENT: &str = "telemetry_session_start";

/// One recorded adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub timestamp: DateTime<Utc>,
    pub factor: f64,
    pub interval: f64,
}

/// Session summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySummary {
    pub profile: String,
    pub cpu_score: f64,
    pub wifi_score: Option<f64>,
    /// Number of recorded events.
    pub adjustments: usize,
    /// Seconds between `start()` and `stop()`; `None` until both happened.
    pub total_time: Option<f64>,
}

/// Messages pushed to a live subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryMessage {
    Event(TelemetryEvent),
    Stop(TelemetrySummary),
}

/// Live consumer of session messages (dashboard, test harness).
///
/// Implementations must not panic or block.
pub trait TelemetrySubscriber: Send + Sync {
    fn publish(&self, message: TelemetryMessage);
}

/// Channel subscriber; a dropped receiver silently discards messages.
impl TelemetrySubscriber for mpsc::UnboundedSender<TelemetryMessage> {
    fn publish(&self, message: TelemetryMessage) {
        if self.send(message).is_err() {
            trace!("Telemetry receiver dropped");
        }
    }
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Started,
    Stopped,
}

/// Ephemeral telemetry session for one invocation.
pub struct TelemetrySession {
    enabled: bool,
    state: SessionState,
    start_time: Option<Instant>,
    end_time: Option<Instant>,
    profile: String,
    context: ContextSnapshot,
    events: Vec<TelemetryEvent>,
    subscriber: Option<Arc<dyn TelemetrySubscriber>>,
    usage: Option<Arc<dyn UsageLog>>,
}

impl TelemetrySession {
    pub fn new(enabled: bool, profile: impl Into<String>, context: ContextSnapshot) -> Self {
        Self {
            enabled,
            state: SessionState::Idle,
            start_time: None,
            end_time: None,
            profile: profile.into(),
            context,
            events: Vec::new(),
            subscriber: None,
            usage: None,
        }
    }

    /// A session that ignores every call.
    pub fn disabled() -> Self {
        Self::new(false, String::new(), ContextSnapshot::neutral())
    }

    pub fn with_subscriber(mut self, subscriber: Option<Arc<dyn TelemetrySubscriber>>) -> Self {
        self.subscriber = subscriber;
        self
    }

    pub fn with_usage_log(mut self, usage: Option<Arc<dyn UsageLog>>) -> Self {
        self.usage = usage;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn events(&self) -> &[TelemetryEvent] {
        &self.events
    }

    pub fn start(&mut self) {
        if !self.enabled || self.state != SessionState::Idle {
            return;
        }
        self.state = SessionState::Started;
        self.start_time = Some(Instant::now());
        if let Some(usage) = &self.usage {
            usage.log_event(SESSION_START_EVENT);
        }
    }

    pub fn record(&mut self, factor: f64, interval: f64) {
        if !self.enabled || self.state != SessionState::Started {
            return;
        }
        let event = TelemetryEvent {
            timestamp: Utc::now(),
            factor: round4(factor),
            interval: round4(interval),
        };
        self.events.push(event);
        if let Some(subscriber) = &self.subscriber {
            subscriber.publish(TelemetryMessage::Event(event));
        }
    }

    pub fn stop(&mut self) {
        if !self.enabled || self.state != SessionState::Started {
            return;
        }
        self.state = SessionState::Stopped;
        self.end_time = Some(Instant::now());
        if let (Some(subscriber), Some(summary)) = (&self.subscriber, self.summary()) {
            subscriber.publish(TelemetryMessage::Stop(summary));
        }
    }

    /// Summary of the session; `None` when disabled.
    pub fn summary(&self) -> Option<TelemetrySummary> {
        if !self.enabled {
            return None;
        }
        let total_time = match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(round4(end.duration_since(start).as_secs_f64())),
            _ => None,
        };
        Some(TelemetrySummary {
            profile: self.profile.clone(),
            cpu_score: self.context.cpu_score,
            wifi_score: self.context.wifi_score,
            adjustments: self.events.len(),
            total_time,
        })
    }
}

impl std::fmt::Debug for TelemetrySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetrySession")
            .field("enabled", &self.enabled)
            .field("state", &self.state)
            .field("profile", &self.profile)
            .field("events", &self.events.len())
            .field("subscriber", &self.subscriber.is_some())
            .finish_non_exhaustive()
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
