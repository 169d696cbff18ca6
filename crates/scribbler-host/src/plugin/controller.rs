use super::context::IsolationContext;
use super::proxy::Proxy;
use super::types::{ModuleIdentity, PluginError, Transition};
use scribbler_types::Session;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, Weak};
use tracing::debug;

/// Permanent host-side handle for one operation
///
/// Identified by (name, menu group) for the lifetime of the application. The
/// backing proxy is replaced every time the owning context is rebuilt and is
/// absent while the context is unloaded.
pub struct Controller {
    name: String,
    menu_group: String,
    description: String,
    module: ModuleIdentity,
    /// Only written by the owning context while its state lock is held
    active: AtomicBool,
    proxy: RwLock<Option<Arc<Proxy>>>,
    context: Weak<IsolationContext>,
}

impl Controller {
    /// New, active controller bound to `proxy`
    pub(crate) fn new(context: Weak<IsolationContext>, proxy: Arc<Proxy>) -> Self {
        Self {
            name: proxy.name().to_string(),
            menu_group: proxy.menu_group().to_string(),
            description: proxy.description().to_string(),
            module: proxy.module().clone(),
            active: AtomicBool::new(true),
            proxy: RwLock::new(Some(proxy)),
            context,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn menu_group(&self) -> &str {
        &self.menu_group
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Identity of the module this operation comes from
    pub fn module(&self) -> &ModuleIdentity {
        &self.module
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Whether a proxy is currently bound (false while the module is unloaded)
    pub fn is_bound(&self) -> bool {
        self.proxy.read().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    /// Label of the management menu entry that toggles this operation
    pub fn menu_label(&self) -> String {
        if self.is_active() {
            format!("Disable {}", self.name)
        } else {
            format!("Enable {}", self.name)
        }
    }

    /// The owning context, while the registry is alive
    pub fn context(&self) -> Option<Arc<IsolationContext>> {
        self.context.upgrade()
    }

    /// Enable or disable the operation
    ///
    /// Enabling the first operation of an unloaded module reloads the module;
    /// disabling the last active one unloads it.
    ///
    /// # Errors
    ///
    /// Returns `PluginError::ModuleChanged` or `PluginError::ContextBuild` if
    /// the module cannot be reloaded; the controller then stays inactive.
    pub fn set_active(&self, active: bool) -> Result<Transition, PluginError> {
        let context = self.context().ok_or_else(|| PluginError::Unavailable {
            plugin: self.name.clone(),
        })?;

        let transition = if active {
            context.activate(self)?
        } else {
            context.deactivate(self)
        };
        debug!("Operation '{}': {:?}", self.name, transition);
        Ok(transition)
    }

    /// Run the operation on `text`
    ///
    /// # Errors
    ///
    /// `InactivePlugin` if disabled, `Unavailable` if no proxy is bound, and
    /// `Execution` if the operation itself fails.
    pub fn execute(&self, text: &str, session: &mut Session) -> Result<String, PluginError> {
        // Take the proxy first: a reference obtained while active stays valid
        // for the whole call even if a teardown starts meanwhile
        let proxy = self.current_proxy();
        if !self.is_active() {
            return Err(PluginError::InactivePlugin {
                plugin: self.name.clone(),
            });
        }
        let proxy = proxy.ok_or_else(|| PluginError::Unavailable {
            plugin: self.name.clone(),
        })?;
        proxy.execute(text, session)
    }

    fn current_proxy(&self) -> Option<Arc<Proxy>> {
        self.proxy.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Replace the proxy after a rebuild; identity and active flag are untouched
    pub(crate) fn rebind(&self, proxy: Arc<Proxy>) {
        debug!("Rebinding '{}' ({})", self.name, self.menu_group);
        *self.proxy.write().unwrap_or_else(|e| e.into_inner()) = Some(proxy);
    }

    pub(crate) fn unbind(&self) {
        *self.proxy.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub(crate) fn set_active_flag(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("name", &self.name)
            .field("menu_group", &self.menu_group)
            .field("module", &self.module.name)
            .field("active", &self.is_active())
            .field("bound", &self.is_bound())
            .finish()
    }
}
