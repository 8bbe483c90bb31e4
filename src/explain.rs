//! Explain Reporter - immutable breakdown of one wait decision

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{RequestedInput, Speed, WaitDecision};

/// Human- and machine-readable record of how an interval was chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainReport {
    pub requested: RequestedInput,
    pub speed_input: Speed,
    pub speed_value: f64,
    pub smart: bool,
    pub profile: String,
    pub aggressiveness: f64,
    pub cpu_score: f64,
    pub wifi_score: Option<f64>,
    pub factor: f64,
    pub bias: f64,
    pub resolved_interval: f64,
    pub final_interval: f64,
    pub min_floor_applied: bool,
    pub max_cap_applied: bool,
    pub timestamp: DateTime<Utc>,
}

impl ExplainReport {
    pub fn from_decision(decision: &WaitDecision) -> Self {
        Self::at(decision, Utc::now())
    }

    pub fn at(decision: &WaitDecision, timestamp: DateTime<Utc>) -> Self {
        Self {
            requested: decision.requested,
            speed_input: decision.speed,
            speed_value: decision.speed_value,
            smart: decision.smart,
            profile: decision.profile.clone(),
            aggressiveness: decision.aggressiveness,
            cpu_score: decision.context.cpu_score,
            wifi_score: decision.context.wifi_score,
            factor: decision.factor,
            bias: decision.bias,
            resolved_interval: decision.resolved_interval,
            final_interval: decision.final_interval,
            min_floor_applied: decision.min_floor_applied,
            max_cap_applied: decision.max_cap_applied,
            timestamp,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ExplainReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let speed = if self.smart {
            format!("smart → {:.2}", self.speed_value)
        } else {
            format!("{} → {:.2}", self.speed_input, self.speed_value)
        };
        let wifi = match self.wifi_score {
            Some(score) => format!("{score:.2}"),
            None => "n/a".to_string(),
        };

        writeln!(f, "nano-wait decision @ {}", self.timestamp.to_rfc3339())?;
        writeln!(f, "  requested      : {}", self.requested)?;
        writeln!(f, "  speed          : {speed}")?;
        writeln!(
            f,
            "  profile        : {} (aggressiveness {:.2})",
            self.profile, self.aggressiveness
        )?;
        writeln!(f, "  context        : cpu {:.2}, wifi {wifi}", self.cpu_score)?;
        writeln!(f, "  factor         : {:.4}", self.factor)?;
        writeln!(f, "  resolved wait  : {:.3}s", self.resolved_interval)?;
        if self.min_floor_applied {
            writeln!(f, "                   (minimum floor applied)")?;
        }
        if self.max_cap_applied {
            writeln!(f, "                   (capped at requested time)")?;
        }
        writeln!(f, "  learned bias   : {:.4}", self.bias)?;
        write!(f, "  final wait     : {:.4}s", self.final_interval)
    }
}
