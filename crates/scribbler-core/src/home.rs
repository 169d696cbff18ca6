//! Home directory resolution
//!
//! # Precedence
//!
//! 1. `SCRIBBLER_HOME` environment variable (if set and non-blank)
//! 2. `dirs::home_dir()` platform default
//!
//! Tests and portable installs set `SCRIBBLER_HOME` so that no global config
//! from the real home directory leaks in.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Get the home directory used to locate the global config file
///
/// # Errors
///
/// Returns an error if `SCRIBBLER_HOME` is unset or blank and the platform
/// home directory cannot be determined.
pub fn get_home_dir() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("SCRIBBLER_HOME") {
        let trimmed = home.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }

    dirs::home_dir().context("Could not determine home directory")
}
