//! Core domain types
//!
//! Connector metadata (registrations, forms, inputs) and the connection/job
//! configurations assembled from it. These are plain single-owner values; the
//! repository projects them to rows on save and rebuilds them on load.

pub mod connection;
pub mod connector;
pub mod element;
pub mod form;
pub mod input;
pub mod job;
