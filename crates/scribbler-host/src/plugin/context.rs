//! Isolation context: one loaded module and the operations it provides
//!
//! The context counts its active controllers. Activating a controller of an
//! unloaded context rebuilds it first; deactivating the last active one tears
//! it down. `Loaded { active: 0 }` is never observable: the count reaching
//! zero and the unload happen under the same lock.

use super::controller::Controller;
use super::guard::contain;
use super::loader::{LoadedModule, ModuleLoader};
use super::proxy::Proxy;
use super::types::{ContextState, ModuleIdentity, PluginError, Transition};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

pub struct IsolationContext {
    identity: ModuleIdentity,
    loader: Arc<dyn ModuleLoader>,
    controllers: Vec<Arc<Controller>>,
    state: Mutex<Lifecycle>,
}

/// Guarded state; `module` is `Some` exactly when loaded
struct Lifecycle {
    module: Option<Arc<LoadedModule>>,
    active: usize,
}

impl IsolationContext {
    /// Load a module and create one active controller per operation it provides
    ///
    /// Operation types whose constructor fails or panics are skipped. A
    /// module that provides no usable operation is returned already unloaded
    /// with no controllers.
    ///
    /// # Errors
    ///
    /// Returns `PluginError::ContextBuild` if the module cannot be loaded.
    pub fn create(
        identity: ModuleIdentity,
        loader: Arc<dyn ModuleLoader>,
    ) -> Result<Arc<Self>, PluginError> {
        let module = Arc::new(loader.load(&identity)?);
        let proxies = instantiate(&module);
        let active = proxies.len();

        let context = Arc::new_cyclic(|weak| {
            let controllers = proxies
                .into_iter()
                .map(|proxy| Arc::new(Controller::new(weak.clone(), proxy)))
                .collect();
            Self {
                identity,
                loader,
                controllers,
                state: Mutex::new(Lifecycle {
                    module: Some(module),
                    active,
                }),
            }
        });

        if active == 0 {
            context.teardown();
        } else {
            info!(
                "Loaded module {} with {} operation(s)",
                context.identity, active
            );
        }
        Ok(context)
    }

    pub fn identity(&self) -> &ModuleIdentity {
        &self.identity
    }

    /// Controllers in the order the module registered its operations
    pub fn controllers(&self) -> &[Arc<Controller>] {
        &self.controllers
    }

    pub fn state(&self) -> ContextState {
        let state = self.lock_state();
        match state.module {
            Some(_) => ContextState::Loaded {
                active: state.active,
            },
            None => ContextState::Unloaded,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.lock_state().module.is_some()
    }

    pub fn active_count(&self) -> usize {
        self.lock_state().active
    }

    /// Unload the module, leaving every controller inactive and unbound
    ///
    /// Safe to call repeatedly. Calls already running keep the module mapped
    /// until they return.
    pub fn teardown(&self) {
        let mut state = self.lock_state();
        for controller in &self.controllers {
            controller.set_active_flag(false);
        }
        state.active = 0;
        self.release(&mut state);
    }

    pub(crate) fn activate(&self, controller: &Controller) -> Result<Transition, PluginError> {
        let mut state = self.lock_state();
        if controller.is_active() {
            return Ok(Transition::Unchanged);
        }

        let reloaded = state.module.is_none();
        if reloaded {
            let (module, proxies) = self.rebuild()?;
            for (sibling, proxy) in self.controllers.iter().zip(proxies) {
                sibling.rebind(proxy);
            }
            state.module = Some(module);
            info!("Reloaded module {}", self.identity);
        }

        controller.set_active_flag(true);
        state.active += 1;
        Ok(Transition::Activated { reloaded })
    }

    pub(crate) fn deactivate(&self, controller: &Controller) -> Transition {
        let mut state = self.lock_state();
        if !controller.is_active() {
            return Transition::Unchanged;
        }

        controller.set_active_flag(false);
        state.active = state.active.saturating_sub(1);

        let unloaded = state.active == 0;
        if unloaded {
            self.release(&mut state);
        }
        Transition::Deactivated { unloaded }
    }

    /// Load the module again and match its operations to the existing controllers
    ///
    /// Returns one proxy per controller, in controller order.
    fn rebuild(&self) -> Result<(Arc<LoadedModule>, Vec<Arc<Proxy>>), PluginError> {
        if let Some(current) = self.loader.current_fingerprint(&self.identity)
            && current != self.identity.fingerprint
        {
            warn!(
                "Module '{}' changed on disk since it was scanned ({} -> {})",
                self.identity.name,
                self.identity.short_fingerprint(),
                &current[..current.len().min(12)]
            );
        }

        let module = Arc::new(self.loader.load(&self.identity)?);
        let fresh = instantiate(&module);
        let matched = reconcile(&self.identity.name, &self.controllers, fresh)?;
        Ok((module, matched))
    }

    /// Drop the module and unbind every controller
    fn release(&self, state: &mut Lifecycle) {
        for controller in &self.controllers {
            controller.unbind();
        }
        if state.module.take().is_some() {
            info!("Unloaded module {}", self.identity);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, Lifecycle> {
        // Every transition writes the count last, so a poisoned state is consistent
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for IsolationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IsolationContext")
            .field("identity", &self.identity)
            .field("state", &self.state())
            .field("controllers", &self.controllers.len())
            .finish()
    }
}

/// Construct one instance of every operation type in the module's catalog
fn instantiate(module: &Arc<LoadedModule>) -> Vec<Arc<Proxy>> {
    let module_name = &module.identity().name;
    let mut proxies: Vec<Arc<Proxy>> = Vec::new();

    for factory in &module.catalog().operations {
        let instance = match contain(|| (factory.create)()) {
            Ok(Ok(instance)) => instance,
            Ok(Err(e)) => {
                warn!(
                    "Skipping operation type {} from module '{}': {}",
                    factory.type_name, module_name, e
                );
                continue;
            }
            Err(panic) => {
                warn!(
                    "Skipping operation type {} from module '{}': constructor panicked: {}",
                    factory.type_name, module_name, panic
                );
                continue;
            }
        };

        let proxy = match Proxy::new(instance, &factory.description, Arc::clone(module)) {
            Ok(proxy) => proxy,
            Err(panic) => {
                warn!(
                    "Skipping operation type {} from module '{}': name panicked: {}",
                    factory.type_name, module_name, panic
                );
                continue;
            }
        };

        if proxy.name().trim().is_empty() {
            warn!(
                "Skipping operation type {} from module '{}': empty name",
                factory.type_name, module_name
            );
            continue;
        }

        if proxies
            .iter()
            .any(|p| p.name() == proxy.name() && p.menu_group() == proxy.menu_group())
        {
            warn!(
                "Skipping duplicate operation '{}' in menu '{}' from module '{}'",
                proxy.name(),
                proxy.menu_group(),
                module_name
            );
            continue;
        }

        debug!(
            "Discovered operation '{}' in menu '{}' from module '{}'",
            proxy.name(),
            proxy.menu_group(),
            module_name
        );
        proxies.push(Arc::new(proxy));
    }

    proxies
}

/// Pair each controller with the fresh proxy of the same (name, menu group)
///
/// The fresh set must match the controllers one to one; anything else means
/// the module was replaced with a different build.
fn reconcile(
    module: &str,
    controllers: &[Arc<Controller>],
    fresh: Vec<Arc<Proxy>>,
) -> Result<Vec<Arc<Proxy>>, PluginError> {
    if fresh.len() != controllers.len() {
        return Err(PluginError::ModuleChanged {
            module: module.to_string(),
            message: format!(
                "expected {} operation(s), found {}",
                controllers.len(),
                fresh.len()
            ),
        });
    }

    let mut remaining: Vec<Option<Arc<Proxy>>> = fresh.into_iter().map(Some).collect();
    let mut matched = Vec::with_capacity(controllers.len());

    for controller in controllers {
        let proxy = remaining
            .iter_mut()
            .find(|slot| {
                slot.as_ref().is_some_and(|p| {
                    p.name() == controller.name() && p.menu_group() == controller.menu_group()
                })
            })
            .and_then(Option::take);

        match proxy {
            Some(proxy) => matched.push(proxy),
            None => {
                return Err(PluginError::ModuleChanged {
                    module: module.to_string(),
                    message: format!(
                        "operation '{}' in menu '{}' is no longer provided",
                        controller.name(),
                        controller.menu_group()
                    ),
                });
            }
        }
    }

    Ok(matched)
}
