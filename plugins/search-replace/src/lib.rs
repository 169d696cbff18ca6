//! Find-and-replace operation module for Scribbler
//!
//! # Building
//!
//! ```bash
//! cargo build --release
//! ```
//!
//! Copy `target/release/libscribbler_search_replace.so` (`.dylib` on macOS,
//! `scribbler_search_replace.dll` on Windows) into the editor's operations
//! directory.
//!
//! The search term and replacement are read from the session keys
//! `replace.search` and `replace.with`.

use scribbler_types::{Operation, OperationDescription, OperationError, Session, export_operations};

pub const SEARCH_KEY: &str = "replace.search";
pub const REPLACEMENT_KEY: &str = "replace.with";

#[derive(Debug, Default)]
pub struct SearchAndReplace;

impl Operation for SearchAndReplace {
    fn name(&self) -> &str {
        "Replace"
    }

    fn execute(&self, text: &str, session: &mut Session) -> Result<String, OperationError> {
        let search = session.get(SEARCH_KEY).unwrap_or_default();
        if search.is_empty() {
            return Ok(text.to_string());
        }
        let replacement = session.get(REPLACEMENT_KEY).unwrap_or_default();
        Ok(text.replace(search, replacement))
    }
}

export_operations! {
    SearchAndReplace => OperationDescription::new("Replaces all instances of the specified text"),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, search: &str, with: &str) -> String {
        let mut session = Session::new()
            .with(SEARCH_KEY, search)
            .with(REPLACEMENT_KEY, with);
        SearchAndReplace.execute(text, &mut session).unwrap()
    }

    #[test]
    fn test_replaces_all_instances() {
        assert_eq!(run("hello world", "world", "there"), "hello there");
        assert_eq!(run("a-b-c", "-", "+"), "a+b+c");
    }

    #[test]
    fn test_unmatched_or_empty_search_leaves_text() {
        assert_eq!(run("hello world", "planet", "there"), "hello world");
        assert_eq!(run("hello world", "", "there"), "hello world");
        assert_eq!(
            SearchAndReplace
                .execute("hello world", &mut Session::new())
                .unwrap(),
            "hello world"
        );
    }

    #[test]
    fn test_missing_replacement_deletes() {
        let mut session = Session::new().with(SEARCH_KEY, "world");
        assert_eq!(
            SearchAndReplace.execute("hello world", &mut session).unwrap(),
            "hello "
        );
    }

    #[test]
    fn test_registration() {
        let catalog = unsafe { Box::from_raw(scribbler_register_operations()) };
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.operations[0].description.menu_group(), "Edit");
        assert_eq!(scribbler_api_version(), scribbler_types::API_VERSION);
    }
}
