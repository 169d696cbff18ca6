//! In-process module loader for testing
//!
//! Modules are lists of operation factories registered by name. Loads and
//! unloads are counted so tests can observe the lifecycle, and a module can
//! be replaced between loads to simulate it changing on disk.

use super::loader::{LoadedModule, ModuleLoader};
use super::types::{ModuleIdentity, PluginError};
use scribbler_types::{
    Operation, OperationCatalog, OperationDescription, OperationError, OperationFactory, Session,
};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Test loader serving modules from memory
#[derive(Default)]
pub struct StaticModuleLoader {
    modules: Mutex<Vec<StaticModule>>,
}

struct StaticModule {
    name: String,
    revision: u64,
    operations: Vec<OperationFactory>,
    failure: Option<String>,
    loads: usize,
    unloads: Arc<AtomicUsize>,
}

impl StaticModule {
    fn fingerprint(&self) -> String {
        Sha256::digest(format!("{}#{}", self.name, self.revision))
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    fn identity(&self) -> ModuleIdentity {
        ModuleIdentity {
            name: self.name.clone(),
            version: None,
            description: None,
            path: PathBuf::from(format!("static/{}", self.name)),
            fingerprint: self.fingerprint(),
        }
    }
}

/// Boundary handle that records the unload when dropped
struct UnloadCounter(Arc<AtomicUsize>);

impl Drop for UnloadCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

impl StaticModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module; modules are reported in registration order
    pub fn with_module(self, name: &str, operations: Vec<OperationFactory>) -> Self {
        self.lock().push(StaticModule {
            name: name.to_string(),
            revision: 0,
            operations,
            failure: None,
            loads: 0,
            unloads: Arc::new(AtomicUsize::new(0)),
        });
        self
    }

    /// Swap a module's operations, as if a new build was dropped in place
    pub fn replace_module(&self, name: &str, operations: Vec<OperationFactory>) {
        let mut modules = self.lock();
        if let Some(module) = modules.iter_mut().find(|m| m.name == name) {
            module.operations = operations;
            module.revision += 1;
        }
    }

    /// Make subsequent loads of a module fail (`None` restores it)
    pub fn fail_loads(&self, name: &str, message: Option<&str>) {
        let mut modules = self.lock();
        if let Some(module) = modules.iter_mut().find(|m| m.name == name) {
            module.failure = message.map(str::to_string);
        }
    }

    /// Identity of a registered module at its current revision
    pub fn identity(&self, name: &str) -> Option<ModuleIdentity> {
        self.lock()
            .iter()
            .find(|m| m.name == name)
            .map(StaticModule::identity)
    }

    /// Identities of all registered modules, as a scan would report them
    pub fn identities(&self) -> Vec<ModuleIdentity> {
        self.lock().iter().map(StaticModule::identity).collect()
    }

    pub fn loads(&self, name: &str) -> usize {
        self.lock()
            .iter()
            .find(|m| m.name == name)
            .map_or(0, |m| m.loads)
    }

    pub fn unloads(&self, name: &str) -> usize {
        self.lock()
            .iter()
            .find(|m| m.name == name)
            .map_or(0, |m| m.unloads.load(Ordering::SeqCst))
    }

    /// Loads not yet released
    pub fn live(&self, name: &str) -> usize {
        self.loads(name).saturating_sub(self.unloads(name))
    }

    fn lock(&self) -> MutexGuard<'_, Vec<StaticModule>> {
        self.modules.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ModuleLoader for StaticModuleLoader {
    fn load(&self, identity: &ModuleIdentity) -> Result<LoadedModule, PluginError> {
        let mut modules = self.lock();
        let module = modules
            .iter_mut()
            .find(|m| m.name == identity.name)
            .ok_or_else(|| PluginError::context_build(&identity.name, "no such static module"))?;

        if let Some(ref message) = module.failure {
            return Err(PluginError::context_build(&identity.name, message.clone()));
        }

        module.loads += 1;
        let catalog = OperationCatalog::new(module.operations.clone());
        let boundary = UnloadCounter(Arc::clone(&module.unloads));
        Ok(LoadedModule::new(identity.clone(), catalog, boundary))
    }

    fn current_fingerprint(&self, identity: &ModuleIdentity) -> Option<String> {
        self.lock()
            .iter()
            .find(|m| m.name == identity.name)
            .map(StaticModule::fingerprint)
    }
}

type RunFn = Arc<dyn Fn(&str, &mut Session) -> Result<String, OperationError> + Send + Sync>;

/// Operation backed by a closure
struct FnOperation {
    name: String,
    run: RunFn,
}

impl Operation for FnOperation {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, text: &str, session: &mut Session) -> Result<String, OperationError> {
        (self.run)(text, session)
    }
}

/// Factory for a closure-backed operation named `name`
pub fn operation_factory<F>(name: &str, description: OperationDescription, run: F) -> OperationFactory
where
    F: Fn(&str, &mut Session) -> Result<String, OperationError> + Send + Sync + 'static,
{
    let run: RunFn = Arc::new(run);
    let op_name = name.to_string();
    OperationFactory::with_constructor(name, description, move || {
        Ok(Box::new(FnOperation {
            name: op_name.clone(),
            run: Arc::clone(&run),
        }) as Box<dyn Operation>)
    })
}
