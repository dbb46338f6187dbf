//! Conduit Repository
//!
//! Persistent metadata repository for Conduit connectors: the versioned
//! schema, row-level repositories per table and the transactional services
//! built on them (connector registration, connection and job storage).

pub mod config;
pub mod db;
pub mod error;
pub mod repository;
pub mod schema;
pub mod service;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error::{RepositoryError, Result};
pub use schema::{SCHEMA_VERSION, SchemaStatus};
pub use service::registration::{RegisteredConnector, RegistrationOutcome};
