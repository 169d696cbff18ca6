use super::Session;

/// Menu group used when an operation does not name one
pub const DEFAULT_MENU_GROUP: &str = "Edit";

/// A text operation provided by a plugin module.
///
/// Implementations live inside a dynamically loaded module and are only ever
/// reached through the host's proxy. Factories wrap every instance so that a
/// panic in `name` or `execute` is caught inside the module and returned as
/// [`OperationError::Failed`].
pub trait Operation: Send + Sync {
    /// Display name, also used to identify the operation across reloads.
    fn name(&self) -> &str;

    /// Transform `text` and return the result.
    ///
    /// `session` carries host-supplied parameters and any state the operation
    /// wants to keep between calls.
    fn execute(&self, text: &str, session: &mut Session) -> Result<String, OperationError>;
}

/// Declarative metadata attached to an operation type at registration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationDescription {
    /// Human-readable description (tooltip text)
    pub description: String,
    /// Menu the operation is placed under; `None` means [`DEFAULT_MENU_GROUP`]
    pub menu_group: Option<String>,
}

impl OperationDescription {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            menu_group: None,
        }
    }

    /// Place the operation under a specific menu
    pub fn in_menu(mut self, group: impl Into<String>) -> Self {
        self.menu_group = Some(group.into());
        self
    }

    /// Resolved menu group, falling back to [`DEFAULT_MENU_GROUP`]
    pub fn menu_group(&self) -> &str {
        match self.menu_group.as_deref() {
            Some(group) if !group.trim().is_empty() => group,
            _ => DEFAULT_MENU_GROUP,
        }
    }
}

/// Errors reported by operations
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl OperationError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            source: None,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
