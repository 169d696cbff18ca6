//! Configuration types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Name of the operations subdirectory next to the executable
pub const OPERATIONS_SUBDIR: &str = "operations";

/// Complete configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Plugin module configuration
    #[serde(default)]
    pub operations: OperationsConfig,
    /// Default session values handed to every operation call: [session]
    #[serde(default)]
    pub session: BTreeMap<String, String>,
}

/// Plugin module configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationsConfig {
    /// Directory scanned for operation modules (default: `<exe dir>/operations`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    /// Root for per-module shadow copies (default: platform cache dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    /// Load shadow copies instead of the module files themselves
    #[serde(default = "default_shadow_copy")]
    pub shadow_copy: bool,
    /// Operation names deactivated right after start-up
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled: Vec<String>,
}

impl Default for OperationsConfig {
    fn default() -> Self {
        Self {
            directory: None,
            cache_dir: None,
            shadow_copy: default_shadow_copy(),
            disabled: Vec::new(),
        }
    }
}

fn default_shadow_copy() -> bool {
    true
}

impl OperationsConfig {
    /// Directory to scan, falling back to the subdirectory of the install location
    pub fn resolved_directory(&self) -> PathBuf {
        if let Some(ref dir) = self.directory {
            return dir.clone();
        }
        install_dir().join(OPERATIONS_SUBDIR)
    }

    /// Root directory for shadow copies
    pub fn resolved_cache_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.cache_dir {
            return dir.clone();
        }
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("scribbler")
    }
}

/// Directory containing the running executable, or the current directory
/// when that cannot be determined
fn install_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.operations.shadow_copy);
        assert!(config.operations.disabled.is_empty());
        assert!(config.session.is_empty());
        assert!(
            config
                .operations
                .resolved_directory()
                .ends_with(OPERATIONS_SUBDIR)
        );
        assert!(config.operations.resolved_cache_dir().ends_with("scribbler"));
    }

    #[test]
    fn test_parse_full_file() {
        let config: Config = toml::from_str(
            r#"
[operations]
directory = "/opt/scribbler/operations"
cache_dir = "/tmp/scribbler-cache"
shadow_copy = false
disabled = ["Spanish", "Word Count"]

[session]
"replace.search" = "world"
"replace.with" = "there"
"#,
        )
        .unwrap();

        assert_eq!(
            config.operations.resolved_directory(),
            PathBuf::from("/opt/scribbler/operations")
        );
        assert_eq!(
            config.operations.resolved_cache_dir(),
            PathBuf::from("/tmp/scribbler-cache")
        );
        assert!(!config.operations.shadow_copy);
        assert_eq!(config.operations.disabled, vec!["Spanish", "Word Count"]);
        assert_eq!(config.session.get("replace.with").map(String::as_str), Some("there"));
    }
}
