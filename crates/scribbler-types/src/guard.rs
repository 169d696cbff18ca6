//! Panic containment inside the module
//!
//! A module is a separate shared library with its own copy of std, so a panic
//! must never unwind out of it into the host. Every operation a factory
//! builds is wrapped in [`Guarded`], which catches panics on the module side
//! of the boundary and reports them as [`OperationError::Failed`].

use super::{Operation, OperationError, Session};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Extract a human-readable message from a panic payload.
pub fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        return (*msg).to_string();
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return msg.clone();
    }
    "non-string panic payload".to_string()
}

/// Run `f`, turning a panic into `Err(message)`.
pub fn catch<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    catch_unwind(AssertUnwindSafe(f)).map_err(panic_message)
}

/// Run an operation constructor and wrap what it builds
///
/// A panicking constructor, or an instance whose `name()` panics, becomes an
/// error instead of an instance.
pub(crate) fn instantiate(
    create: impl FnOnce() -> Result<Box<dyn Operation>, OperationError>,
) -> Result<Box<dyn Operation>, OperationError> {
    let inner = catch(create)
        .map_err(|msg| OperationError::failed(format!("constructor panicked: {msg}")))??;
    let name = catch(|| inner.name().to_string())
        .map_err(|msg| OperationError::failed(format!("name panicked: {msg}")))?;
    Ok(Box::new(Guarded { name, inner }))
}

/// Operation wrapper that keeps panics inside the module
struct Guarded {
    name: String,
    inner: Box<dyn Operation>,
}

impl Operation for Guarded {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, text: &str, session: &mut Session) -> Result<String, OperationError> {
        catch(|| self.inner.execute(text, session))
            .unwrap_or_else(|msg| Err(OperationError::failed(format!("panicked: {msg}"))))
    }
}
