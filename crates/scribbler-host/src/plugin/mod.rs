pub mod context;
pub mod controller;
mod guard;
pub mod loader;
pub mod manifest;
pub mod proxy;
pub mod registry;
pub mod scanner;
#[cfg(any(test, feature = "test-support"))]
pub mod static_loader;
pub mod types;

pub use context::IsolationContext;
pub use controller::Controller;
pub use loader::{LoadedModule, ModuleLoader, NativeModuleLoader};
pub use manifest::ModuleManifest;
pub use proxy::Proxy;
pub use registry::OperationManager;
pub use scanner::ModuleScanner;
#[cfg(any(test, feature = "test-support"))]
pub use static_loader::{StaticModuleLoader, operation_factory};
pub use types::{ContextState, ModuleIdentity, PluginError, Transition};
