//! Error types for the scripting crate

use crate::registry::{PropertyError, RegistryError};
use progs_core::ProgsError;

/// Script-specific error types
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Static check failure
    #[error("Compile error: {0}")]
    Compile(String),

    /// Recoverable runtime failure raised by a statement or built-in
    #[error("{0}")]
    Runtime(String),

    /// Program executed without a successful compile
    #[error("Program {0} has not been successfully compiled")]
    NotCompiled(String),

    /// Arguments do not fit the program signature
    #[error("Program {program} expects ({expected}) but was given ({actual})")]
    ArgumentMismatch {
        program: String,
        expected: String,
        actual: String,
    },

    /// Host step budget exhausted
    #[error("Step budget of {0} statements exhausted")]
    StepBudgetExhausted(u64),

    /// Nested program calls went too deep
    #[error("Call depth limit of {0} exceeded")]
    CallDepthExceeded(usize),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Property(#[from] PropertyError),

    /// No overload accepts the argument types
    #[error("No function matches {0}")]
    UnknownFunction(String),

    /// More than one overload is equally good
    #[error("Ambiguous call to {0}")]
    AmbiguousCall(String),
}

impl ScriptError {
    pub fn runtime(message: impl Into<String>) -> Self {
        ScriptError::Runtime(message.into())
    }
}

impl From<ScriptError> for ProgsError {
    fn from(err: ScriptError) -> Self {
        match err {
            ScriptError::Compile(message) => ProgsError::Compile(message),
            ScriptError::Registry(err) => ProgsError::Registry(err.to_string()),
            other => ProgsError::Runtime(other.to_string()),
        }
    }
}

/// Result type for scripting operations
pub type Result<T> = std::result::Result<T, ScriptError>;
