use std::fmt;
use std::path::PathBuf;

/// Identity of a module file found by the scanner
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleIdentity {
    /// Module name, from the sidecar manifest or the file stem
    pub name: String,
    /// Declared version, if the module ships a manifest that names one
    pub version: Option<String>,
    /// Declared description, if the module ships a manifest that has one
    pub description: Option<String>,
    /// Absolute path to the library file
    pub path: PathBuf,
    /// Hex-encoded SHA-256 of the library file at scan time
    pub fingerprint: String,
}

impl ModuleIdentity {
    /// First 12 hex digits of the fingerprint
    pub fn short_fingerprint(&self) -> &str {
        let end = self.fingerprint.len().min(12);
        &self.fingerprint[..end]
    }
}

impl fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(ref version) => write!(f, "{}@{}", self.name, version),
            None => write!(f, "{}@{}", self.name, self.short_fingerprint()),
        }
    }
}

/// Load state of an isolation context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Module code is not mapped; controllers have no proxies
    Unloaded,
    /// Module code is mapped and `active` controllers are enabled
    Loaded { active: usize },
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextState::Unloaded => write!(f, "unloaded"),
            ContextState::Loaded { active } => write!(f, "loaded ({active} active)"),
        }
    }
}

/// What a call to `Controller::set_active` changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The controller was already in the requested state
    Unchanged,
    /// The controller became active; `reloaded` is set when the module had
    /// to be loaded again first
    Activated { reloaded: bool },
    /// The controller became inactive; `unloaded` is set when it was the
    /// last active controller of its module
    Deactivated { unloaded: bool },
}

impl Transition {
    /// Whether the controller's active flag flipped
    pub fn changed(&self) -> bool {
        !matches!(self, Transition::Unchanged)
    }
}

/// Plugin host errors with structured variants
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("invalid module {path}: {message}")]
    ModuleValidation { path: PathBuf, message: String },

    #[error("failed to build context for module '{module}': {message}")]
    ContextBuild {
        module: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("module '{module}' changed on disk: {message}")]
    ModuleChanged { module: String, message: String },

    #[error("operation '{plugin}' failed: {message}")]
    Execution { plugin: String, message: String },

    #[error("operation '{plugin}' is not active")]
    InactivePlugin { plugin: String },

    #[error("operation '{plugin}' is not available: its module is not loaded")]
    Unavailable { plugin: String },

    #[error("no operation named '{plugin}'")]
    NotFound { plugin: String },

    #[error("plugin config error: {message}")]
    Config { message: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PluginError {
    pub(crate) fn context_build(module: &str, message: impl Into<String>) -> Self {
        PluginError::ContextBuild {
            module: module.to_string(),
            message: message.into(),
            source: None,
        }
    }
}
