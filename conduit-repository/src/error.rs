//! Error types for repository operations

use conduit_core::ModelError;
use thiserror::Error;

/// Result type alias for repository operations
pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Errors that can occur while creating, reading or writing the repository
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Pre-flight validation, schema integrity or value decoding failed
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The storage engine rejected or failed the operation
    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    /// Schema creation was invoked against an initialized repository
    #[error("Repository schema already initialized (version {0})")]
    AlreadyInitialized(u32),

    /// The repository was created by a different schema version
    #[error("Unsupported repository schema version {0}")]
    UnsupportedVersion(i64),

    /// The version table exists but does not hold a usable version
    #[error("Repository schema is corrupt: {0}")]
    CorruptSchema(String),

    /// Schema creation is disabled and the repository has no schema
    #[error("Repository schema is not initialized")]
    NotInitialized,

    /// Requested entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

impl RepositoryError {
    pub fn schema_integrity(message: impl Into<String>) -> Self {
        Self::Model(ModelError::schema_integrity(message))
    }

    /// Check if this error is a schema integrity violation
    pub fn is_schema_integrity(&self) -> bool {
        matches!(self, Self::Model(ModelError::SchemaIntegrity(_)))
    }

    /// Check if this error is a pre-flight validation failure
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Model(ModelError::Validation(_)))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
