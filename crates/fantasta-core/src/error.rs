// Error type shared by every draft operation.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DraftError {
    /// A pick referenced a name that is not in the roster.
    #[error("player not found in roster: {name}")]
    NotFound { name: String },

    /// The player is already picked or marked unavailable.
    #[error("player already taken: {name}")]
    AlreadyTaken { name: String },

    #[error("invalid configuration for `{field}`: {message}")]
    InvalidConfiguration { field: String, message: String },

    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),
}

impl DraftError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        DraftError::InvalidConfiguration {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
