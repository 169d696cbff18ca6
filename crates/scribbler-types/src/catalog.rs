//! Module registration: the catalog a module hands to the host on load

use super::guard::instantiate;
use super::{Operation, OperationDescription, OperationError};
use std::sync::Arc;

/// Contract revision. Bumped on any breaking change to the types in this crate.
pub const API_VERSION: u32 = 1;

/// Exported symbol returning the module's [`API_VERSION`]
pub const API_VERSION_SYMBOL: &[u8] = b"scribbler_api_version";

/// Exported symbol returning a `Box::into_raw`'d [`OperationCatalog`]
pub const ENTRY_SYMBOL: &[u8] = b"scribbler_register_operations";

/// Constructor for one operation type
pub type OperationFactoryFn =
    Arc<dyn Fn() -> Result<Box<dyn Operation>, OperationError> + Send + Sync>;

/// A constructible operation type plus its declarative metadata
#[derive(Clone)]
pub struct OperationFactory {
    /// Rust type name, used in diagnostics only
    pub type_name: String,
    pub description: OperationDescription,
    pub create: OperationFactoryFn,
}

impl OperationFactory {
    /// Factory for a `Default`-constructible operation type
    pub fn of<T>(description: OperationDescription) -> Self
    where
        T: Operation + Default + 'static,
    {
        Self {
            type_name: std::any::type_name::<T>().to_string(),
            description,
            create: Arc::new(|| {
                instantiate(|| Ok(Box::new(T::default()) as Box<dyn Operation>))
            }),
        }
    }

    /// Factory with a custom constructor that may fail
    ///
    /// Panics in the constructor become errors, as do panics in the built
    /// instance's `name`.
    pub fn with_constructor<F>(
        type_name: impl Into<String>,
        description: OperationDescription,
        create: F,
    ) -> Self
    where
        F: Fn() -> Result<Box<dyn Operation>, OperationError> + Send + Sync + 'static,
    {
        Self {
            type_name: type_name.into(),
            description,
            create: Arc::new(move || instantiate(&create)),
        }
    }
}

impl std::fmt::Debug for OperationFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationFactory")
            .field("type_name", &self.type_name)
            .field("description", &self.description)
            .field("create", &"<factory_fn>")
            .finish()
    }
}

/// Everything a module exports, in registration order
#[derive(Debug, Clone)]
pub struct OperationCatalog {
    pub api_version: u32,
    pub operations: Vec<OperationFactory>,
}

impl OperationCatalog {
    pub fn new(operations: Vec<OperationFactory>) -> Self {
        Self {
            api_version: API_VERSION,
            operations,
        }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Export operation types from a plugin module.
///
/// Generates the two C-ABI entry points the host looks up:
/// `scribbler_api_version` and `scribbler_register_operations`. Each listed
/// type must implement [`Operation`] and `Default`.
///
/// ```ignore
/// scribbler_types::export_operations! {
///     SearchAndReplace => OperationDescription::new("Replaces all instances of the specified text"),
///     WordCount => OperationDescription::new("Counts words").in_menu("Statistics"),
/// }
/// ```
#[macro_export]
macro_rules! export_operations {
    ($($ty:ty => $desc:expr),* $(,)?) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn scribbler_api_version() -> u32 {
            $crate::API_VERSION
        }

        /// Ownership of the returned catalog passes to the host, which frees
        /// it with `Box::from_raw`.
        #[unsafe(no_mangle)]
        pub extern "C" fn scribbler_register_operations() -> *mut $crate::OperationCatalog {
            let catalog = $crate::OperationCatalog::new(vec![
                $($crate::OperationFactory::of::<$ty>($desc)),*
            ]);
            Box::into_raw(Box::new(catalog))
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Session;

    #[derive(Default)]
    struct Reverse;

    impl Operation for Reverse {
        fn name(&self) -> &str {
            "Reverse"
        }

        fn execute(&self, text: &str, _session: &mut Session) -> Result<String, OperationError> {
            Ok(text.chars().rev().collect())
        }
    }

    #[derive(Default)]
    struct Noop;

    #[derive(Default)]
    struct Buggy;

    impl Operation for Buggy {
        fn name(&self) -> &str {
            "Buggy"
        }

        fn execute(&self, _text: &str, _session: &mut Session) -> Result<String, OperationError> {
            panic!("plugin bug")
        }
    }

    impl Operation for Noop {
        fn name(&self) -> &str {
            "Noop"
        }

        fn execute(&self, text: &str, _session: &mut Session) -> Result<String, OperationError> {
            Ok(text.to_string())
        }
    }

    crate::export_operations! {
        Reverse => OperationDescription::new("Reverses the document").in_menu("Format"),
        Noop => OperationDescription::default(),
        Buggy => OperationDescription::new("Always panics"),
    }

    #[test]
    fn test_exported_entry_points() {
        assert_eq!(scribbler_api_version(), API_VERSION);

        let ptr = scribbler_register_operations();
        assert!(!ptr.is_null());
        // Safety: produced by Box::into_raw in the generated entry point
        let catalog = unsafe { Box::from_raw(ptr) };

        assert_eq!(catalog.api_version, API_VERSION);
        assert_eq!(catalog.len(), 3);
        assert!(catalog.operations[0].type_name.ends_with("Reverse"));
        assert_eq!(catalog.operations[0].description.menu_group(), "Format");
        assert_eq!(catalog.operations[1].description.menu_group(), "Edit");

        let op = (catalog.operations[0].create)().unwrap();
        let mut session = Session::new();
        assert_eq!(op.name(), "Reverse");
        assert_eq!(op.execute("abc", &mut session).unwrap(), "cba");
    }

    #[test]
    fn test_exported_operation_panic_stays_in_module() {
        // Safety: produced by Box::into_raw in the generated entry point
        let catalog = unsafe { Box::from_raw(scribbler_register_operations()) };
        let buggy = (catalog.operations[2].create)().unwrap();
        let mut session = Session::new();

        assert_eq!(buggy.name(), "Buggy");
        let err = buggy.execute("text", &mut session).unwrap_err();
        assert!(matches!(err, OperationError::Failed { .. }));
        assert_eq!(err.to_string(), "panicked: plugin bug");
    }

    #[test]
    fn test_constructor_panic_is_an_error() {
        let factory = OperationFactory::with_constructor(
            "Exploding",
            OperationDescription::default(),
            || panic!("constructor bug"),
        );
        let err = (factory.create)().err().unwrap();
        assert_eq!(err.to_string(), "constructor panicked: constructor bug");
    }

    #[test]
    fn test_custom_constructor_can_fail() {
        let factory = OperationFactory::with_constructor(
            "Broken",
            OperationDescription::new("never builds"),
            || Err(OperationError::failed("missing resource")),
        );
        let result = (factory.create)();
        assert!(result.is_err());
        assert!(format!("{factory:?}").contains("<factory_fn>"));
    }
}
