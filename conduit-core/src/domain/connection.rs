//! Connection configuration
//!
//! A connection is a user-supplied set of values for a connector's
//! CONNECTION forms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::element::{MAX_NAME_LENGTH, validate_identifier};
use crate::domain::form::{Form, FormType};
use crate::error::{ModelError, Result};

/// Connection to an external system through one connector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// Assigned by the repository on creation
    pub id: Option<i64>,
    pub name: String,
    pub connector_name: String,
    pub forms: Vec<Form>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Connection {
    /// Build a new, unsaved connection from the connector's CONNECTION forms
    pub fn new(name: impl Into<String>, connector_name: impl Into<String>, forms: Vec<Form>) -> Self {
        Self {
            id: None,
            name: name.into(),
            connector_name: connector_name.into(),
            forms,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn form(&self, name: &str) -> Option<&Form> {
        self.forms.iter().find(|form| form.name() == name)
    }

    pub fn form_mut(&mut self, name: &str) -> Option<&mut Form> {
        self.forms.iter_mut().find(|form| form.name() == name)
    }

    pub fn validate(&self) -> Result<()> {
        validate_identifier("Connection", &self.name, MAX_NAME_LENGTH)?;
        validate_config_forms(
            &format!("Connection '{}'", self.name),
            &self.connector_name,
            FormType::Connection,
            &self.forms,
        )
    }
}

/// Forms of a connection or job must all be of `form_type` and belong to
/// `connector_name`, and their values must satisfy input constraints.
pub(crate) fn validate_config_forms(
    owner: &str,
    connector_name: &str,
    form_type: FormType,
    forms: &[Form],
) -> Result<()> {
    for form in forms {
        if form.form_type() != form_type {
            return Err(ModelError::schema_integrity(format!(
                "{} holds {} form '{}', expected {} forms only",
                owner,
                form.form_type(),
                form.name(),
                form_type
            )));
        }
        if form.connector_name() != connector_name {
            return Err(ModelError::schema_integrity(format!(
                "{} holds form '{}' of connector '{}', expected '{}'",
                owner,
                form.name(),
                form.connector_name(),
                connector_name
            )));
        }
        form.validate_values()?;
    }
    Ok(())
}
