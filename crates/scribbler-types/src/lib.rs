//! Operation contract for Scribbler plugin modules
//!
//! A plugin module is a shared library that depends on this crate, implements
//! [`Operation`] for one or more `Default`-constructible types and exports them
//! with [`export_operations!`]:
//!
//! ```ignore
//! use scribbler_types::{export_operations, Operation, OperationDescription, OperationError, Session};
//!
//! #[derive(Default)]
//! pub struct Shout;
//!
//! impl Operation for Shout {
//!     fn name(&self) -> &str {
//!         "Shout"
//!     }
//!
//!     fn execute(&self, text: &str, _session: &mut Session) -> Result<String, OperationError> {
//!         Ok(text.to_uppercase())
//!     }
//! }
//!
//! export_operations! {
//!     Shout => OperationDescription::new("Upper-cases the document").in_menu("Format"),
//! }
//! ```
//!
//! Every instance a factory builds is wrapped so that a panic inside the
//! module is caught there and reported as [`OperationError::Failed`].
//!
//! The host and every module must be built with the same compiler and the same
//! version of this crate. [`API_VERSION`] is checked at load time.

pub mod catalog;
pub mod guard;
pub mod operation;
pub mod session;

pub use catalog::{
    API_VERSION, API_VERSION_SYMBOL, ENTRY_SYMBOL, OperationCatalog, OperationFactory,
    OperationFactoryFn,
};
pub use operation::{DEFAULT_MENU_GROUP, Operation, OperationDescription, OperationError};
pub use session::Session;
