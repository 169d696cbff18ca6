//! Document statistics for Scribbler
//!
//! Both operations return the text unchanged and report their count in the
//! session under `result.characters` and `result.words`.

use scribbler_types::{Operation, OperationDescription, OperationError, Session, export_operations};

pub const CHARACTERS_KEY: &str = "result.characters";
pub const WORDS_KEY: &str = "result.words";

#[derive(Debug, Default)]
pub struct CharacterCount;

impl Operation for CharacterCount {
    fn name(&self) -> &str {
        "Character Count"
    }

    fn execute(&self, text: &str, session: &mut Session) -> Result<String, OperationError> {
        session.set(CHARACTERS_KEY, text.chars().count().to_string());
        Ok(text.to_string())
    }
}

#[derive(Debug, Default)]
pub struct WordCount;

impl Operation for WordCount {
    fn name(&self) -> &str {
        "Word Count"
    }

    fn execute(&self, text: &str, session: &mut Session) -> Result<String, OperationError> {
        session.set(WORDS_KEY, text.split_whitespace().count().to_string());
        Ok(text.to_string())
    }
}

export_operations! {
    CharacterCount => OperationDescription::new("Counts the characters in the document").in_menu("Statistics"),
    WordCount => OperationDescription::new("Counts the words in the document").in_menu("Statistics"),
}
