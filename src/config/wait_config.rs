//! Wait Configuration - operator-tunable defaults loaded from TOML
//!
//! Each struct implements `Default` with the built-in behaviour, so running
//! without a config file changes nothing.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults::{
    CONFIG_ENV_VAR, LEARNING_FILE_NAME, LOCAL_CONFIG_FILE, USAGE_ENV_VAR, USAGE_FILE_NAME,
    USAGE_ID_FILE_NAME,
};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `WaitConfig::load()` which searches:
/// 1. `$NANO_WAIT_CONFIG` env var
/// 2. `./nano_wait.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaitConfig {
    /// Adaptive learning store
    #[serde(default)]
    pub learning: LearningConfig,

    /// Local anonymous usage log
    #[serde(default)]
    pub usage: UsageConfig,

    /// Defaults applied when the caller does not specify a value
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

impl WaitConfig {
    /// Load configuration using the standard search order.
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded wait config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        // 2. Check ./nano_wait.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded wait config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        // 3. Defaults
        tracing::debug!("No config file found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Wait config saved");
        Ok(())
    }

    /// Validate values that serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.defaults.speed.trim().is_empty() {
            errors.push("defaults.speed must not be empty".to_string());
        }
        if self.learning.path.as_os_str().is_empty() || self.learning.path.is_dir() {
            errors.push(format!(
                "learning.path must name a file, got {:?}",
                self.learning.path
            ));
        }
        if self.usage.path.as_os_str().is_empty() {
            errors.push("usage.path must not be empty".to_string());
        }
        if let Some(profile) = &self.defaults.profile {
            if profile.trim().is_empty() {
                errors.push("defaults.profile must not be empty when set".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Where and whether per-profile bias is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LearningConfig {
    /// `false` keeps learning in memory for the lifetime of the process.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_learning_path")]
    pub path: PathBuf,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_learning_path(),
        }
    }
}

/// Local, anonymous usage log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsageConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_usage_path")]
    pub path: PathBuf,

    #[serde(default = "default_usage_id_path")]
    pub id_path: PathBuf,
}

impl UsageConfig {
    /// Config flag combined with the `NANO_WAIT_TELEMETRY=0` kill switch.
    pub fn effective_enabled(&self) -> bool {
        self.enabled && std::env::var(USAGE_ENV_VAR).map_or(true, |v| v != "0")
    }
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_usage_path(),
            id_path: default_usage_id_path(),
        }
    }
}

/// Invocation defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Speed descriptor: `slow`, `normal`, `fast`, `ultra` or a number.
    #[serde(default = "default_speed")]
    pub speed: String,

    /// Profile used when the caller names none (`None` means `auto`).
    #[serde(default)]
    pub profile: Option<String>,

    /// Collect a telemetry session for every wait.
    #[serde(default)]
    pub telemetry: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            profile: None,
            telemetry: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_speed() -> String {
    "normal".to_string()
}

fn default_learning_path() -> PathBuf {
    super::home_dir().join(LEARNING_FILE_NAME)
}

fn default_usage_path() -> PathBuf {
    super::home_dir().join(USAGE_FILE_NAME)
}

fn default_usage_id_path() -> PathBuf {
    super::home_dir().join(USAGE_ID_FILE_NAME)
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O error ({0:?}): {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("config parse error ({0:?}): {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(WaitConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: WaitConfig = toml::from_str(
            r#"
[defaults]
speed = "fast"
"#,
        )
        .unwrap();
        assert_eq!(config.defaults.speed, "fast");
        assert!(config.learning.enabled);
        assert!(config.defaults.profile.is_none());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result: Result<WaitConfig, _> = toml::from_str(
            r#"
[learning]
enabeld = false
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_speed_fails_validation() {
        let mut config = WaitConfig::default();
        config.defaults.speed = "  ".to_string();
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("defaults.speed"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nano_wait.toml");

        let mut config = WaitConfig::default();
        config.defaults.profile = Some("rpa".to_string());
        config.learning.path = dir.path().join("learning.json");
        config.save_to_file(&path).unwrap();

        let loaded = WaitConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
