//! Letter case conversions for Scribbler
//!
//! Each operation records which conversion ran last in the session under
//! `case.last`, so a later call can repeat or undo it.

use scribbler_types::{Operation, OperationDescription, OperationError, Session, export_operations};

pub const LAST_KEY: &str = "case.last";

#[derive(Debug, Default)]
pub struct UpperCase;

impl Operation for UpperCase {
    fn name(&self) -> &str {
        "Upper Case"
    }

    fn execute(&self, text: &str, session: &mut Session) -> Result<String, OperationError> {
        session.set(LAST_KEY, "upper");
        Ok(text.to_uppercase())
    }
}

#[derive(Debug, Default)]
pub struct LowerCase;

impl Operation for LowerCase {
    fn name(&self) -> &str {
        "Lower Case"
    }

    fn execute(&self, text: &str, session: &mut Session) -> Result<String, OperationError> {
        session.set(LAST_KEY, "lower");
        Ok(text.to_lowercase())
    }
}

export_operations! {
    UpperCase => OperationDescription::new("Converts the document to upper case").in_menu("Format"),
    LowerCase => OperationDescription::new("Converts the document to lower case").in_menu("Format"),
}
