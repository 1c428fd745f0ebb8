//! Unified error handling for slircbot.
//!
//! Each subsystem has its own error type here; only `main` collapses them
//! into `anyhow`.

use thiserror::Error;

// ============================================================================
// Startup errors
// ============================================================================

/// Errors building the trigger grammar. Always fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationError {
    #[error("trigger must not be empty")]
    EmptyTrigger,

    #[error("trigger must not contain whitespace: {0:?}")]
    WhitespaceTrigger(String),

    #[error("invalid trigger pattern: {0}")]
    Pattern(String),
}

// ============================================================================
// Registry errors (surfaced to load/unload callers, never to chat)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("module already registered: {0}")]
    DuplicateModule(String),

    #[error("module not found: {0}")]
    NotFound(String),

    #[error("module {0} declares no commands, events or shorthands")]
    UnreachableModule(String),

    #[error("module {module} declares invalid command name {command:?}")]
    InvalidCommandName { module: String, command: String },

    #[error("unknown module in manifest: {0}")]
    UnknownModule(String),
}

// ============================================================================
// Module errors (caught at the dispatcher boundary)
// ============================================================================

/// Failure raised from inside a module's `run`.
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("database error: {0}")]
    Db(#[from] crate::db::DbError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("external service error: {0}")]
    External(String),

    #[error("handler panicked: {0}")]
    Panicked(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ModuleError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Db(_) => "db",
            Self::Http(_) => "http",
            Self::External(_) => "external",
            Self::Panicked(_) => "panic",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result returned by module handlers. `Some(true)` marks an event as
/// handled for fan-out bookkeeping; commands count as handled regardless.
pub type ModuleResult = Result<Option<bool>, ModuleError>;

// ============================================================================
// Connection errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("irc client error: {0}")]
    Irc(#[from] irc::error::Error),

    #[error("connection closed by server")]
    Closed,

    #[error("server sent ERROR: {0}")]
    ServerError(String),
}
