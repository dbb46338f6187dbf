//! Repository Module
//!
//! Row-level data access for the repository schema.
//! Each repository handles the rows of one table; multi-table units of work
//! are composed in the service layer inside a transaction. All functions take
//! a connection so they run the same inside or outside a transaction.

pub mod connection;
pub mod connector;
pub mod form;
pub mod input;
pub mod job;
pub mod value;

// Re-export for convenience
pub use connection as connection_repository;
pub use connector as connector_repository;
pub use form as form_repository;
pub use input as input_repository;
pub use job as job_repository;
pub use value as value_repository;
