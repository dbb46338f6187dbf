//! Service Module
//!
//! Units of work over the repository. Services compose the row-level
//! repositories inside transactions so a failed operation never leaves a
//! partial row set behind.

pub mod configuration;
pub mod registration;

// Re-export for convenience
pub use configuration as configuration_service;
pub use registration as registration_service;
