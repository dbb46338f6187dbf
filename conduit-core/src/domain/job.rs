//! Job configuration
//!
//! A job binds a connection to values for the connector's JOB forms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::connection::validate_config_forms;
use crate::domain::element::{MAX_NAME_LENGTH, validate_identifier};
use crate::domain::form::{Form, FormType};
use crate::error::Result;

/// Transfer job configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Assigned by the repository on creation
    pub id: Option<i64>,
    pub name: String,
    pub connection_id: i64,
    pub forms: Vec<Form>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(name: impl Into<String>, connection_id: i64, forms: Vec<Form>) -> Self {
        Self {
            id: None,
            name: name.into(),
            connection_id,
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

    /// `connector_name` is the connector of the job's connection
    pub fn validate(&self, connector_name: &str) -> Result<()> {
        validate_identifier("Job", &self.name, MAX_NAME_LENGTH)?;
        validate_config_forms(
            &format!("Job '{}'", self.name),
            connector_name,
            FormType::Job,
            &self.forms,
        )
    }
}
