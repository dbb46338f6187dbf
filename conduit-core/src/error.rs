//! Error types for the configuration model

use thiserror::Error;

use crate::domain::input::InputType;

/// Result type alias for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised while building, validating or decoding configuration metadata
#[derive(Debug, Error)]
pub enum ModelError {
    /// An encoded value could not be decoded for the input's kind
    #[error("Malformed value for input '{input}' ({kind}): {reason}")]
    MalformedValue {
        /// Name of the offending input (qualified with its form when known)
        input: String,
        /// Kind the value was decoded as
        kind: InputType,
        /// Decoder message
        reason: String,
    },

    /// Duplicate names, colliding form indices or dangling parent references
    #[error("Schema integrity violation: {0}")]
    SchemaIntegrity(String),

    /// Column width or value domain constraint violated
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl ModelError {
    pub fn schema_integrity(message: impl Into<String>) -> Self {
        Self::SchemaIntegrity(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Prefix the input name of a `MalformedValue` with its owning form
    pub(crate) fn within_form(self, form: &str) -> Self {
        match self {
            Self::MalformedValue {
                input,
                kind,
                reason,
            } => Self::MalformedValue {
                input: format!("{form}.{input}"),
                kind,
                reason,
            },
            other => other,
        }
    }
}
