//! Local anonymous usage log
//!
//! One JSON line per event, appended to a local file. Nothing is transmitted.
//! The anonymous id is a random UUID persisted next to the log so repeated
//! runs on one machine share it. Every failure is swallowed.

use chrono::Utc;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

use crate::config::UsageConfig;

/// Fire-and-forget usage signal sink.
///
/// Implementations must not panic and must not block for long; callers never
/// wait on the result.
pub trait UsageLog: Send + Sync {
    fn log_event(&self, event: &str);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopUsageLog;

impl UsageLog for NoopUsageLog {
    fn log_event(&self, _event: &str) {}
}

#[derive(Serialize)]
struct UsageRecord<'a> {
    anon_id: &'a str,
    event: &'a str,
    version: &'a str,
    ts: String,
}

/// Appends usage events to a JSONL file.
#[derive(Debug)]
pub struct JsonlUsageLog {
    path: PathBuf,
    id_path: PathBuf,
    anon_id: OnceLock<String>,
}

impl JsonlUsageLog {
    pub fn new(path: impl Into<PathBuf>, id_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            id_path: id_path.into(),
            anon_id: OnceLock::new(),
        }
    }

    pub fn from_config(config: &UsageConfig) -> Self {
        Self::new(&config.path, &config.id_path)
    }

    /// Persistent anonymous id, created on first use.
    pub fn anon_id(&self) -> &str {
        self.anon_id.get_or_init(|| load_or_create_id(&self.id_path))
    }

    fn append(&self, event: &str) -> std::io::Result<()> {
        let record = UsageRecord {
            anon_id: self.anon_id(),
            event,
            version: env!("CARGO_PKG_VERSION"),
            ts: Utc::now().to_rfc3339(),
        };
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&line)
    }
}

impl UsageLog for JsonlUsageLog {
    fn log_event(&self, event: &str) {
        if let Err(e) = self.append(event) {
            debug!(path = %self.path.display(), error = %e, "Usage event dropped");
        }
    }
}

fn load_or_create_id(path: &Path) -> String {
    if let Ok(existing) = std::fs::read_to_string(path) {
        let existing = existing.trim();
        if !existing.is_empty() {
            return existing.to_string();
        }
    }

    let id = uuid::Uuid::new_v4().to_string();
    if let Err(e) = std::fs::write(path, &id) {
        debug!(path = %path.display(), error = %e, "Could not persist anonymous id");
    }
    id
}
