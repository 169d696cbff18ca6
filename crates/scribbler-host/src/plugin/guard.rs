//! Host-side panic containment for calls into module code
//!
//! Factories built with `scribbler_types` catch panics inside the module, so
//! a module's panic reaches the host as an ordinary `OperationError`. This
//! guard covers the remaining cases: operations served in-process, and
//! factories a module assembled by hand without the wrapper. A panic from a
//! native module that bypassed the wrapper cannot be caught here.

/// Run `f`, turning a panic into `Err(message)`.
///
/// Anything `f` touches is treated as unwind safe: after a panic the caller
/// only reports the failure and never inspects state `f` may have left
/// half-updated, except the session, which the operation owns for the call.
pub(crate) fn contain<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    scribbler_types::guard::catch(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contain_passes_value_through() {
        assert_eq!(contain(|| 7), Ok(7));
    }

    #[test]
    fn test_contain_static_str_panic() {
        let result: Result<(), String> = contain(|| panic!("boom"));
        assert_eq!(result, Err("boom".to_string()));
    }
}
