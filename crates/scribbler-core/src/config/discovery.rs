//! Configuration discovery and resolution

use super::types::Config;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error
    #[error("TOML parsing error in {path}: {source}")]
    TomlParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Command-line overrides for configuration
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    /// Override the operations directory
    pub operations_dir: Option<PathBuf>,
    /// Override the shadow copy root
    pub cache_dir: Option<PathBuf>,
    /// Override shadow copying
    pub shadow_copy: Option<bool>,
    /// Path to an explicit config file, applied after global and repo-local files
    pub config_path: Option<PathBuf>,
}

/// A config file as written on disk; absent keys leave lower layers untouched
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    operations: OperationsFile,
    #[serde(default)]
    session: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct OperationsFile {
    directory: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    shadow_copy: Option<bool>,
    disabled: Option<Vec<String>>,
}

/// Resolve configuration from all sources
///
/// Priority (highest to lowest):
/// 1. Command-line overrides (an explicit `config_path` must exist and parse)
/// 2. Environment variables
/// 3. Repo-local config (.scribbler.toml in current dir or up to git root)
/// 4. Global config (~/.config/scribbler/config.toml)
/// 5. Defaults
///
/// Unparsable global or repo-local files are skipped with a warning.
pub fn resolve_config(
    overrides: &ConfigOverrides,
    current_dir: &Path,
    home_dir: &Path,
) -> Result<Config, ConfigError> {
    let mut config = Config::default();

    // 4. Try global config
    let global_config_path = home_dir.join(".config/scribbler/config.toml");
    if global_config_path.exists() {
        match load_config_file(&global_config_path) {
            Ok(file_config) => merge_config(&mut config, file_config),
            Err(e) => warn!("Skipping global config: {e}"),
        }
    }

    // 3. Try repo-local config (current dir or git root)
    if let Some(repo_config) = find_repo_local_config(current_dir) {
        match load_config_file(&repo_config) {
            Ok(file_config) => merge_config(&mut config, file_config),
            Err(e) => warn!("Skipping repo config: {e}"),
        }
    }

    // 2. Apply environment variables
    apply_env_overrides(&mut config);

    // 1. Apply command-line overrides
    if let Some(ref path) = overrides.config_path {
        let file_config = load_config_file(path)?;
        debug!("Loaded config from {}", path.display());
        merge_config(&mut config, file_config);
    }
    apply_cli_overrides(&mut config, overrides);

    Ok(config)
}

/// Find repo-local config file
///
/// Searches current directory and parent directories up to git root
fn find_repo_local_config(current_dir: &Path) -> Option<PathBuf> {
    let mut dir = current_dir;

    loop {
        let config_path = dir.join(".scribbler.toml");
        if config_path.exists() {
            return Some(config_path);
        }

        // Stop at git root
        if dir.join(".git").exists() {
            break;
        }

        dir = dir.parent()?;
    }

    None
}

fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Merge file config into base config
fn merge_config(base: &mut Config, file: ConfigFile) {
    let ops = file.operations;
    if ops.directory.is_some() {
        base.operations.directory = ops.directory;
    }
    if ops.cache_dir.is_some() {
        base.operations.cache_dir = ops.cache_dir;
    }
    if let Some(shadow_copy) = ops.shadow_copy {
        base.operations.shadow_copy = shadow_copy;
    }
    if let Some(disabled) = ops.disabled {
        base.operations.disabled = disabled;
    }

    // Session defaults: later sources override individual keys
    base.session.extend(file.session);
}

/// Apply environment variable overrides
fn apply_env_overrides(config: &mut Config) {
    if let Ok(dir) = std::env::var("SCRIBBLER_OPERATIONS_DIR") {
        if !dir.trim().is_empty() {
            config.operations.directory = Some(PathBuf::from(dir.trim()));
        }
    }

    if let Ok(dir) = std::env::var("SCRIBBLER_CACHE_DIR") {
        if !dir.trim().is_empty() {
            config.operations.cache_dir = Some(PathBuf::from(dir.trim()));
        }
    }

    if std::env::var("SCRIBBLER_NO_SHADOW_COPY").is_ok() {
        config.operations.shadow_copy = false;
    }
}

/// Apply command-line overrides
fn apply_cli_overrides(config: &mut Config, overrides: &ConfigOverrides) {
    if let Some(ref dir) = overrides.operations_dir {
        config.operations.directory = Some(dir.clone());
    }

    if let Some(ref dir) = overrides.cache_dir {
        config.operations.cache_dir = Some(dir.clone());
    }

    if let Some(shadow_copy) = overrides.shadow_copy {
        config.operations.shadow_copy = shadow_copy;
    }
}
