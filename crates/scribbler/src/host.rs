//! Start-up shared by every command: configuration, then the operation manager

use anyhow::{Context, Result};
use scribbler_core::config::{Config, ConfigOverrides, resolve_config};
use scribbler_core::home::get_home_dir;
use scribbler_host::{Controller, NativeModuleLoader, OperationManager, PluginError};
use scribbler_types::Session;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::commands::GlobalArgs;

/// Session keys under this prefix are reported back to the user
pub const RESULT_PREFIX: &str = "result.";

pub struct Host {
    pub config: Config,
    pub directory: PathBuf,
    pub manager: OperationManager,
}

impl Host {
    /// Resolve configuration and load every module in the operations directory
    pub fn start(global: &GlobalArgs) -> Result<Self> {
        let home_dir = get_home_dir()?;
        let current_dir = std::env::current_dir().context("Failed to read current directory")?;

        let overrides = ConfigOverrides {
            operations_dir: global.operations_dir.clone(),
            cache_dir: None,
            shadow_copy: global.no_shadow_copy.then_some(false),
            config_path: global.config.clone(),
        };
        let config = resolve_config(&overrides, &current_dir, &home_dir)
            .context("Failed to resolve configuration")?;

        let directory = config.operations.resolved_directory();
        let cache_dir = config.operations.resolved_cache_dir();
        debug!(
            "Operations directory {}, shadow copies in {}",
            directory.display(),
            cache_dir.display()
        );

        let loader =
            NativeModuleLoader::new(cache_dir).with_shadow_copy(config.operations.shadow_copy);
        let manager = OperationManager::initialize(&directory, Arc::new(loader))
            .with_context(|| format!("Failed to scan operations directory {}", directory.display()))?;
        manager.apply_disabled(&config.operations.disabled);

        Ok(Self {
            config,
            directory,
            manager,
        })
    }

    /// Fresh session seeded with the configured defaults
    pub fn session(&self) -> Session {
        self.config
            .session
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    /// Controller for `name`, optionally restricted to one menu
    pub fn find(&self, name: &str, group: Option<&str>) -> Result<&Arc<Controller>, PluginError> {
        let found = match group {
            Some(group) => self.manager.find(name, group),
            None => self.manager.find_by_name(name),
        };
        found.ok_or_else(|| PluginError::NotFound {
            plugin: name.to_string(),
        })
    }
}

/// Session values an operation reported back
pub fn results(session: &Session) -> impl Iterator<Item = (&str, &str)> {
    session.with_prefix(RESULT_PREFIX)
}
