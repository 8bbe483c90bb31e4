//! Configuration Module
//!
//! Provides the TOML-backed [`WaitConfig`] plus the constants in [`defaults`].
//!
//! ## Loading Order
//!
//! 1. `NANO_WAIT_CONFIG` environment variable (path to TOML file)
//! 2. `nano_wait.toml` in the current working directory
//! 3. Built-in defaults
//!
//! Unlike a process-wide singleton, the loaded config is handed to
//! [`crate::engine::WaitEngine::from_config`] explicitly.

mod wait_config;
pub mod defaults;

pub use wait_config::*;

use std::path::PathBuf;

/// Home directory used to anchor the default learning and usage files.
///
/// Falls back to the working directory when neither `HOME` nor
/// `USERPROFILE` is set.
pub fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
}
