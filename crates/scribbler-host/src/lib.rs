//! Plugin isolation and lifecycle host for the Scribbler editor
//!
//! Operation modules are shared libraries found in an operations directory.
//! Each module is loaded into its own [`IsolationContext`]; every operation it
//! exports is reached through a [`Controller`], the host's permanent handle,
//! which survives the context being unloaded and reloaded as operations are
//! disabled and re-enabled.

pub mod menu;
pub mod plugin;

pub use menu::{Menu, MenuAction, MenuBar, MenuEntry, PLUGINS_MENU};
pub use plugin::{
    ContextState, Controller, IsolationContext, LoadedModule, ModuleIdentity, ModuleLoader,
    ModuleScanner, NativeModuleLoader, OperationManager, PluginError, Proxy, Transition,
};
