//! Connector registration

use serde::{Deserialize, Serialize};

use crate::domain::element::{MAX_CLASS_LENGTH, MAX_NAME_LENGTH, validate_identifier};
use crate::error::Result;

/// An installed connector implementation, keyed by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorRegistration {
    name: String,
    implementation_class: String,
}

impl ConnectorRegistration {
    /// # Errors
    /// Returns `ModelError::Validation` when either field is empty or wider
    /// than its column.
    pub fn new(name: impl Into<String>, implementation_class: impl Into<String>) -> Result<Self> {
        let registration = Self {
            name: name.into(),
            implementation_class: implementation_class.into(),
        };
        registration.validate()?;
        Ok(registration)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Opaque identifier of the pluggable implementation
    pub fn implementation_class(&self) -> &str {
        &self.implementation_class
    }

    pub fn validate(&self) -> Result<()> {
        validate_identifier("Connector", &self.name, MAX_NAME_LENGTH)?;
        validate_identifier(
            "Connector implementation class",
            &self.implementation_class,
            MAX_CLASS_LENGTH,
        )
    }
}
