//! Error types for the variable register

use progs_core::ProgsError;

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("Stored type description {0} is not a valid type")]
    InvalidType(String),

    #[error("Stored value for {owner}.{name} does not fit its declared type")]
    InvalidValue { owner: String, name: String },

    #[error("{0} is not a reference type")]
    InvalidOwner(String),
}

impl From<RegisterError> for ProgsError {
    fn from(err: RegisterError) -> Self {
        ProgsError::InvalidData(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RegisterError>;
