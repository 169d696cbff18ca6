//! Configuration resolution
//!
//! Resolves configuration from multiple sources with priority:
//! 1. Command-line flags (passed as parameters)
//! 2. Environment variables
//! 3. Repo-local config (.scribbler.toml)
//! 4. Global config (~/.config/scribbler/config.toml)
//! 5. Defaults

mod discovery;
mod types;

pub use discovery::{ConfigError, ConfigOverrides, resolve_config};
pub use types::{Config, OperationsConfig};
