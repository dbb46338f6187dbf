//! Conduit Core
//!
//! Connector configuration metadata for the Conduit data-movement platform.
//!
//! This crate contains:
//! - Domain types: connectors, forms, inputs and the connection/job
//!   configurations built from them
//! - Value codecs: the URL-safe string form every input kind is persisted as
//! - DTOs: the resolved parameter set handed to the execution engine
//!
//! Note: Persistence lives in `conduit-repository`; nothing here performs I/O.

pub mod codec;
pub mod domain;
pub mod dto;
pub mod error;

pub use codec::{BooleanKind, InputKind, IntegerKind, MapKind, MapValue, StringKind};
pub use domain::connection::Connection;
pub use domain::connector::ConnectorRegistration;
pub use domain::element::NamedElement;
pub use domain::form::{Form, FormType};
pub use domain::input::{
    BooleanInput, FormInput, Input, InputDescriptor, InputType, IntegerInput, MapInput,
    StringInput,
};
pub use domain::job::Job;
pub use dto::parameters::{ParameterSet, resolve_parameters};
pub use error::{ModelError, Result};
