use super::guard::contain;
use super::loader::LoadedModule;
use super::types::{ModuleIdentity, PluginError};
use scribbler_types::{Operation, OperationDescription, Session};
use std::sync::Arc;

/// Bridge to one operation instance living inside a loaded module
///
/// Metadata is read once at construction. The proxy holds its module, so an
/// in-flight `execute` keeps the module's code mapped even if the context is
/// torn down meanwhile.
pub struct Proxy {
    // Dropped before `module`: the instance's code lives in the module
    instance: Box<dyn Operation>,
    name: String,
    description: String,
    menu_group: String,
    module: Arc<LoadedModule>,
}

impl Proxy {
    /// Wrap an instance, reading its name across the boundary
    ///
    /// Fails with the panic message if the instance panics while being asked
    /// for its name.
    pub(crate) fn new(
        instance: Box<dyn Operation>,
        description: &OperationDescription,
        module: Arc<LoadedModule>,
    ) -> Result<Self, String> {
        let name = contain(|| instance.name().to_string())?;
        Ok(Self {
            instance,
            name,
            description: description.description.clone(),
            menu_group: description.menu_group().to_string(),
            module,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn menu_group(&self) -> &str {
        &self.menu_group
    }

    pub fn module(&self) -> &ModuleIdentity {
        self.module.identity()
    }

    /// Run the operation once
    ///
    /// Returned errors and panics both become `PluginError::Execution`.
    pub fn execute(&self, text: &str, session: &mut Session) -> Result<String, PluginError> {
        match contain(|| self.instance.execute(text, session)) {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(PluginError::Execution {
                plugin: self.name.clone(),
                message: e.to_string(),
            }),
            Err(panic) => Err(PluginError::Execution {
                plugin: self.name.clone(),
                message: format!("panicked: {panic}"),
            }),
        }
    }
}

impl std::fmt::Debug for Proxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proxy")
            .field("name", &self.name)
            .field("menu_group", &self.menu_group)
            .field("module", &self.module.identity().name)
            .finish()
    }
}
