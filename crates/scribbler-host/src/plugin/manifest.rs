//! Optional sidecar manifest next to a module library
//!
//! A module `libsearch_replace.so` may ship `libsearch_replace.toml`:
//!
//! ```toml
//! [module]
//! name = "search-replace"
//! version = "0.1.0"
//! description = "Find and replace"
//! ```

use super::types::PluginError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleManifest {
    pub module: ModuleSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleSection {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ModuleManifest {
    /// Path of the sidecar manifest for a library file
    pub fn sidecar_path(library: &Path) -> PathBuf {
        library.with_extension("toml")
    }

    /// Load and validate the sidecar manifest, if the module has one
    pub fn load_sidecar(library: &Path) -> Result<Option<Self>, PluginError> {
        let path = Self::sidecar_path(library);
        if !path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path).map_err(|source| PluginError::Io {
            path: path.clone(),
            source,
        })?;
        let manifest = Self::parse(&content).map_err(|message| PluginError::ModuleValidation {
            path: path.clone(),
            message,
        })?;
        Ok(Some(manifest))
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let manifest: ModuleManifest =
            toml::from_str(content).map_err(|e| format!("invalid manifest: {e}"))?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<(), String> {
        let name = &self.module.name;
        if name.is_empty() {
            return Err("module name cannot be empty".to_string());
        }
        // The name becomes part of the shadow copy directory
        if !is_valid_name(name) {
            return Err(format!(
                "invalid module name '{name}': use letters, digits, '-' and '_'"
            ));
        }
        if let Some(ref version) = self.module.version
            && version.trim().is_empty()
        {
            return Err("module version cannot be blank".to_string());
        }
        Ok(())
    }
}

pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
