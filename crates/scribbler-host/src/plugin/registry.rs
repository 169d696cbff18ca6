//! Operation manager: composition root of the plugin subsystem

use super::context::IsolationContext;
use super::controller::Controller;
use super::loader::ModuleLoader;
use super::scanner::ModuleScanner;
use super::types::{ModuleIdentity, PluginError, Transition};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Owns every isolation context and exposes their controllers as one flat list
///
/// Controllers are ordered by module discovery order, then by the order each
/// module registered its operations. Dropping the manager unloads every module.
#[derive(Debug, Default)]
pub struct OperationManager {
    contexts: Vec<Arc<IsolationContext>>,
    controllers: Vec<Arc<Controller>>,
}

impl OperationManager {
    /// Scan `directory` and load every module found there
    ///
    /// Modules that fail to load are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error only if the directory itself cannot be scanned; a
    /// missing directory yields an empty manager.
    pub fn initialize(directory: &Path, loader: Arc<dyn ModuleLoader>) -> Result<Self, PluginError> {
        let identities = ModuleScanner::scan(directory)?;
        info!(
            "Found {} module(s) in {}",
            identities.len(),
            directory.display()
        );
        Ok(Self::from_modules(identities, loader))
    }

    /// Load the given modules in order
    pub fn from_modules(
        identities: impl IntoIterator<Item = ModuleIdentity>,
        loader: Arc<dyn ModuleLoader>,
    ) -> Self {
        let mut manager = Self::default();

        for identity in identities {
            let context = match IsolationContext::create(identity, Arc::clone(&loader)) {
                Ok(context) => context,
                Err(e) => {
                    warn!("Skipping module: {}", e);
                    continue;
                }
            };

            if context.controllers().is_empty() {
                warn!(
                    "Skipping module {}: it provides no operations",
                    context.identity()
                );
                continue;
            }

            for controller in context.controllers() {
                if manager.find(controller.name(), controller.menu_group()).is_some() {
                    warn!(
                        "Operation '{}' in menu '{}' from module '{}' duplicates an earlier one",
                        controller.name(),
                        controller.menu_group(),
                        context.identity().name
                    );
                }
                manager.controllers.push(Arc::clone(controller));
            }
            manager.contexts.push(context);
        }

        manager
    }

    /// All controllers, in discovery order
    pub fn controllers(&self) -> &[Arc<Controller>] {
        &self.controllers
    }

    /// All loaded contexts, in discovery order
    pub fn contexts(&self) -> &[Arc<IsolationContext>] {
        &self.contexts
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Look up a controller by its permanent identity
    pub fn find(&self, name: &str, menu_group: &str) -> Option<&Arc<Controller>> {
        self.controllers
            .iter()
            .find(|c| c.name() == name && c.menu_group() == menu_group)
    }

    /// First controller with the given name, in any menu
    pub fn find_by_name(&self, name: &str) -> Option<&Arc<Controller>> {
        self.controllers.iter().find(|c| c.name() == name)
    }

    /// Enable or disable the first operation named `name`
    pub fn set_active(&self, name: &str, active: bool) -> Result<Transition, PluginError> {
        let controller = self
            .find_by_name(name)
            .ok_or_else(|| PluginError::NotFound {
                plugin: name.to_string(),
            })?;

        let transition = controller.set_active(active)?;
        match transition {
            Transition::Activated { reloaded: true } => {
                info!("Enabled '{}' (module {} reloaded)", name, controller.module().name)
            }
            Transition::Deactivated { unloaded: true } => {
                info!("Disabled '{}' (module {} unloaded)", name, controller.module().name)
            }
            Transition::Activated { .. } => info!("Enabled '{}'", name),
            Transition::Deactivated { .. } => info!("Disabled '{}'", name),
            Transition::Unchanged => {}
        }
        Ok(transition)
    }

    /// Deactivate every operation with one of the given names
    ///
    /// Unknown names are logged and ignored.
    pub fn apply_disabled(&self, names: &[String]) {
        for name in names {
            let matching: Vec<_> = self.controllers.iter().filter(|c| c.name() == name).collect();
            if matching.is_empty() {
                warn!("Cannot disable '{}': no operation with that name", name);
                continue;
            }

            for controller in matching {
                if let Err(e) = controller.set_active(false) {
                    warn!("Cannot disable '{}': {}", name, e);
                }
            }
        }
    }
}

impl Drop for OperationManager {
    fn drop(&mut self) {
        for context in &self.contexts {
            context.teardown();
        }
    }
}
