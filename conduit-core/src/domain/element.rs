//! Named element
//!
//! Common identity of every metadata entity, plus the column width limits the
//! repository schema imposes on identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ModelError, Result};

/// Width of every `name` column
pub const MAX_NAME_LENGTH: usize = 64;

/// Width of `connector.implementation_class`
pub const MAX_CLASS_LENGTH: usize = 255;

/// Largest value a SMALLINT column (indices, max lengths) can hold
pub const MAX_SMALLINT: u16 = i16::MAX as u16;

/// A metadata entity identified by an immutable, human-readable name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedElement {
    name: String,
}

impl NamedElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check the name fits a `name` column
    pub fn validate(&self, entity: &str) -> Result<()> {
        validate_identifier(entity, &self.name, MAX_NAME_LENGTH)
    }
}

impl fmt::Display for NamedElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Reject empty identifiers and identifiers wider than `max` characters
pub fn validate_identifier(entity: &str, value: &str, max: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ModelError::validation(format!(
            "{} name cannot be empty",
            entity
        )));
    }

    let width = value.chars().count();
    if width > max {
        return Err(ModelError::validation(format!(
            "{} '{}' is too long ({} characters, max {})",
            entity, value, width, max
        )));
    }

    Ok(())
}
