//! Data Transfer Objects for the execution boundary
//!
//! The execution engine never sees inputs or forms; it receives the resolved
//! values as a flat parameter set.

pub mod parameters;
