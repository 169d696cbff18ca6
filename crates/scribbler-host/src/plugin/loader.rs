//! Module loading: turns a module identity into a live operation catalog

use super::scanner::fingerprint_file;
use super::types::{ModuleIdentity, PluginError};
use libloading::{Library, Symbol};
use scribbler_types::{API_VERSION, API_VERSION_SYMBOL, ENTRY_SYMBOL, OperationCatalog};
use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Creates isolation boundaries for modules
///
/// Implemented by [`NativeModuleLoader`] for shared libraries. Tests drive the
/// lifecycle with an in-process loader instead.
pub trait ModuleLoader: Send + Sync {
    /// Load the module and read its operation catalog
    ///
    /// # Errors
    ///
    /// Returns `PluginError::ContextBuild` if the boundary cannot be created
    /// or the module does not export a usable catalog.
    fn load(&self, identity: &ModuleIdentity) -> Result<LoadedModule, PluginError>;

    /// Fingerprint of the module as it currently exists, if it can be computed
    fn current_fingerprint(&self, identity: &ModuleIdentity) -> Option<String>;
}

/// A module whose code is mapped, plus the catalog it registered
///
/// Dropping the last reference releases the boundary. The catalog's factory
/// closures point into module code, so they are dropped first.
pub struct LoadedModule {
    identity: ModuleIdentity,
    catalog: OperationCatalog,
    _boundary: Box<dyn Any + Send + Sync>,
}

impl LoadedModule {
    /// Wrap a catalog together with whatever keeps its code alive
    pub fn new<B>(identity: ModuleIdentity, catalog: OperationCatalog, boundary: B) -> Self
    where
        B: Any + Send + Sync,
    {
        Self {
            identity,
            catalog,
            _boundary: Box::new(boundary),
        }
    }

    pub fn identity(&self) -> &ModuleIdentity {
        &self.identity
    }

    pub fn catalog(&self) -> &OperationCatalog {
        &self.catalog
    }
}

impl std::fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModule")
            .field("identity", &self.identity)
            .field("operations", &self.catalog.len())
            .finish()
    }
}

/// Loads modules as shared libraries via `libloading`
///
/// With shadow copying enabled (the default), each load copies the module to
/// `<cache root>/cache-<module name>/` and loads the copy, so the original
/// file can be replaced while the application runs. Every load gets a fresh
/// file name so a reload never reuses a mapping the OS still holds.
pub struct NativeModuleLoader {
    cache_root: PathBuf,
    shadow_copy: bool,
    generation: AtomicU64,
}

impl NativeModuleLoader {
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
            shadow_copy: true,
            generation: AtomicU64::new(0),
        }
    }

    pub fn with_shadow_copy(mut self, enabled: bool) -> Self {
        self.shadow_copy = enabled;
        self
    }

    pub fn shadow_copy(&self) -> bool {
        self.shadow_copy
    }

    /// Directory holding the shadow copies of one module
    pub fn shadow_dir(&self, identity: &ModuleIdentity) -> PathBuf {
        self.cache_root.join(format!("cache-{}", identity.name))
    }

    fn prepare_shadow_copy(&self, identity: &ModuleIdentity) -> Result<PathBuf, PluginError> {
        let dir = self.shadow_dir(identity);
        std::fs::create_dir_all(&dir)
            .map_err(|e| build_error(identity, "failed to create shadow copy directory", e))?;

        let file_name = identity
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("module");
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let target = dir.join(format!("{}-{}-{}", std::process::id(), generation, file_name));

        std::fs::copy(&identity.path, &target)
            .map_err(|e| build_error(identity, "failed to shadow copy module", e))?;
        debug!("Shadow copied {} to {}", identity.path.display(), target.display());
        Ok(target)
    }
}

impl ModuleLoader for NativeModuleLoader {
    fn load(&self, identity: &ModuleIdentity) -> Result<LoadedModule, PluginError> {
        let load_path = if self.shadow_copy {
            self.prepare_shadow_copy(identity)?
        } else {
            identity.path.clone()
        };

        // Declared before the library so a failed load removes the copy
        // only after the library is released
        let mut boundary = NativeLibrary {
            module: identity.name.clone(),
            library: None,
            shadow_path: self.shadow_copy.then(|| load_path.clone()),
        };

        // Safety: loading runs the module's initialisers. Only modules from
        // the configured operations directory are loaded.
        let library = unsafe { Library::new(&load_path) }
            .map_err(|e| build_error(identity, "failed to load library", e))?;

        let catalog = read_catalog(&library, identity)?;
        boundary.library = Some(library);

        Ok(LoadedModule::new(identity.clone(), catalog, boundary))
    }

    fn current_fingerprint(&self, identity: &ModuleIdentity) -> Option<String> {
        fingerprint_file(&identity.path).ok()
    }
}

/// Check the module's API version and take ownership of its catalog
fn read_catalog(
    library: &Library,
    identity: &ModuleIdentity,
) -> Result<OperationCatalog, PluginError> {
    // Safety: the symbol types match what `export_operations!` generates
    let api_version = unsafe {
        let symbol: Symbol<extern "C" fn() -> u32> = library
            .get(API_VERSION_SYMBOL)
            .map_err(|e| {
                build_error(identity, "library missing 'scribbler_api_version' symbol", e)
            })?;
        symbol()
    };
    if api_version != API_VERSION {
        return Err(PluginError::context_build(
            &identity.name,
            format!("module API version {api_version}, host expects {API_VERSION}"),
        ));
    }

    let catalog = unsafe {
        let symbol: Symbol<extern "C" fn() -> *mut OperationCatalog> = library
            .get(ENTRY_SYMBOL)
            .map_err(|e| {
                build_error(identity, "library missing 'scribbler_register_operations' symbol", e)
            })?;

        let catalog_ptr = symbol();
        if catalog_ptr.is_null() {
            return Err(PluginError::context_build(
                &identity.name,
                "registration function returned null",
            ));
        }

        // Take ownership of the catalog (allocated with Box::into_raw by the module)
        Box::from_raw(catalog_ptr)
    };

    if catalog.api_version != API_VERSION {
        return Err(PluginError::context_build(
            &identity.name,
            format!(
                "catalog API version {}, host expects {API_VERSION}",
                catalog.api_version
            ),
        ));
    }

    Ok(*catalog)
}

fn build_error(
    identity: &ModuleIdentity,
    message: &str,
    source: impl std::error::Error + Send + Sync + 'static,
) -> PluginError {
    PluginError::ContextBuild {
        module: identity.name.clone(),
        message: format!("{message}: {}", identity.path.display()),
        source: Some(Box::new(source)),
    }
}

/// A mapped library and the shadow copy it was loaded from
struct NativeLibrary {
    module: String,
    library: Option<Library>,
    shadow_path: Option<PathBuf>,
}

impl Drop for NativeLibrary {
    fn drop(&mut self) {
        if let Some(library) = self.library.take() {
            match library.close() {
                Ok(()) => debug!("Unloaded module '{}'", self.module),
                Err(e) => warn!("Failed to unload module '{}': {}", self.module, e),
            }
        }

        if let Some(ref path) = self.shadow_path {
            remove_shadow_copy(path);
        }
    }
}

fn remove_shadow_copy(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed shadow copy {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => debug!("Failed to remove shadow copy {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn identity_for(path: &Path) -> ModuleIdentity {
        ModuleIdentity {
            name: "broken".to_string(),
            version: None,
            description: None,
            path: path.to_path_buf(),
            fingerprint: fingerprint_file(path).unwrap(),
        }
    }

    #[test]
    fn test_loading_garbage_is_context_build_error() {
        let temp = TempDir::new().unwrap();
        let module = temp.path().join("libbroken.so");
        std::fs::write(&module, b"\x7fELF but not really").unwrap();
        let cache = temp.path().join("cache");

        let loader = NativeModuleLoader::new(&cache);
        let identity = identity_for(&module);
        let err = loader.load(&identity).unwrap_err();
        assert!(matches!(err, PluginError::ContextBuild { ref module, .. } if module == "broken"));

        // The shadow copy does not outlive the failed load
        let shadow_dir = loader.shadow_dir(&identity);
        assert_eq!(shadow_dir, cache.join("cache-broken"));
        assert_eq!(std::fs::read_dir(&shadow_dir).unwrap().count(), 0);
        // The original is untouched
        assert!(module.exists());
    }

    #[test]
    fn test_missing_module_without_shadow_copy() {
        let temp = TempDir::new().unwrap();
        let module = temp.path().join("libbroken.so");
        std::fs::write(&module, b"\x7fELF").unwrap();
        let identity = identity_for(&module);
        std::fs::remove_file(&module).unwrap();

        let loader = NativeModuleLoader::new(temp.path().join("cache")).with_shadow_copy(false);
        assert!(!loader.shadow_copy());
        let err = loader.load(&identity).unwrap_err();
        assert!(matches!(err, PluginError::ContextBuild { .. }));
        assert!(!temp.path().join("cache").exists());
        assert!(loader.current_fingerprint(&identity).is_none());
    }

    #[test]
    fn test_shadow_copies_get_distinct_names() {
        let temp = TempDir::new().unwrap();
        let module = temp.path().join("libbroken.so");
        std::fs::write(&module, b"\x7fELF").unwrap();
        let identity = identity_for(&module);

        let loader = NativeModuleLoader::new(temp.path().join("cache"));
        let first = loader.prepare_shadow_copy(&identity).unwrap();
        let second = loader.prepare_shadow_copy(&identity).unwrap();
        assert_ne!(first, second);
        assert_eq!(std::fs::read(&first).unwrap(), b"\x7fELF");
        assert_eq!(
            loader.current_fingerprint(&identity).as_deref(),
            Some(identity.fingerprint.as_str())
        );
    }
}
