//! Forms
//!
//! A form is an ordered group of inputs a connector declares for either its
//! connections or its jobs.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::domain::element::{MAX_NAME_LENGTH, MAX_SMALLINT, NamedElement, validate_identifier};
use crate::domain::input::FormInput;
use crate::error::{ModelError, Result};

/// Purpose of a form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormType {
    Connection,
    Job,
}

impl FormType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormType::Connection => "CONNECTION",
            FormType::Job => "JOB",
        }
    }
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CONNECTION" => Ok(FormType::Connection),
            "JOB" => Ok(FormType::Job),
            other => Err(ModelError::validation(format!(
                "Unknown form type '{}'",
                other
            ))),
        }
    }
}

/// A named, ordered collection of inputs scoped to one connector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    element: NamedElement,
    connector_name: String,
    form_type: FormType,
    index: u16,
    inputs: Vec<FormInput>,
}

impl Form {
    pub fn new(
        connector_name: impl Into<String>,
        name: impl Into<String>,
        form_type: FormType,
        index: u16,
        inputs: Vec<FormInput>,
    ) -> Self {
        Self {
            element: NamedElement::new(name),
            connector_name: connector_name.into(),
            form_type,
            index,
            inputs,
        }
    }

    pub fn name(&self) -> &str {
        self.element.name()
    }

    pub fn connector_name(&self) -> &str {
        &self.connector_name
    }

    pub fn form_type(&self) -> FormType {
        self.form_type
    }

    /// Position among the connector's forms of the same type
    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn inputs(&self) -> &[FormInput] {
        &self.inputs
    }

    pub fn input(&self, name: &str) -> Option<&FormInput> {
        self.inputs.iter().find(|input| input.name() == name)
    }

    pub fn input_mut(&mut self, name: &str) -> Option<&mut FormInput> {
        self.inputs.iter_mut().find(|input| input.name() == name)
    }

    /// Restore one input's value, naming `form.input` on failure
    pub fn restore_input(&mut self, input_name: &str, encoded: &str) -> Result<()> {
        let form_name = self.name().to_string();
        let input = self.input_mut(input_name).ok_or_else(|| {
            ModelError::schema_integrity(format!(
                "Form '{}' has no input '{}'",
                form_name, input_name
            ))
        })?;
        input
            .restore_from_url_safe_string(encoded)
            .map_err(|e| e.within_form(&form_name))
    }

    pub fn clear_values(&mut self) {
        for input in &mut self.inputs {
            input.clear_value();
        }
    }

    /// Same name, type, index and input declarations; values are ignored
    pub fn same_structure(&self, other: &Form) -> bool {
        self.name() == other.name()
            && self.connector_name == other.connector_name
            && self.form_type == other.form_type
            && self.index == other.index
            && self.inputs.len() == other.inputs.len()
            && self
                .inputs
                .iter()
                .zip(&other.inputs)
                .all(|(a, b)| a.descriptor() == b.descriptor())
    }

    /// Check the declaration fits the `form` and `input` tables
    pub fn validate(&self) -> Result<()> {
        validate_identifier("Form", self.name(), MAX_NAME_LENGTH)?;
        validate_identifier("Connector", &self.connector_name, MAX_NAME_LENGTH)?;

        if self.index > MAX_SMALLINT {
            return Err(ModelError::validation(format!(
                "Form '{}' index {} exceeds {}",
                self.name(),
                self.index,
                MAX_SMALLINT
            )));
        }

        if self.inputs.len() > MAX_SMALLINT as usize {
            return Err(ModelError::validation(format!(
                "Form '{}' declares too many inputs ({})",
                self.name(),
                self.inputs.len()
            )));
        }

        let mut seen = HashSet::new();
        for input in &self.inputs {
            input.validate_declaration()?;
            if !seen.insert(input.name()) {
                return Err(ModelError::schema_integrity(format!(
                    "Form '{}' of connector '{}' declares input '{}' twice",
                    self.name(),
                    self.connector_name,
                    input.name()
                )));
            }
        }

        Ok(())
    }

    /// Check every input value against its constraints
    pub fn validate_values(&self) -> Result<()> {
        for input in &self.inputs {
            input
                .validate_value()
                .map_err(|e| self.qualify_validation(e))?;
        }
        Ok(())
    }

    /// Check a value supplied for `input` against this form's declaration
    ///
    /// The supplied input must have the declared kind, and its value must
    /// decode and satisfy the declared constraints. Errors name `form.input`.
    pub fn check_value(&self, input: &FormInput) -> Result<()> {
        let declared = self.input(input.name()).ok_or_else(|| {
            ModelError::schema_integrity(format!(
                "Form '{}' of connector '{}' declares no input '{}'",
                self.name(),
                self.connector_name,
                input.name()
            ))
        })?;

        if declared.input_type() != input.input_type() {
            return Err(ModelError::schema_integrity(format!(
                "Input '{}.{}' is declared as {} but was given a {} value",
                self.name(),
                input.name(),
                declared.input_type(),
                input.input_type()
            )));
        }

        let mut checked = declared.clone();
        checked
            .restore_from_url_safe_string(&input.to_url_safe_string())
            .map_err(|e| e.within_form(self.name()))?;
        checked
            .validate_value()
            .map_err(|e| self.qualify_validation(e))
    }

    fn qualify_validation(&self, error: ModelError) -> ModelError {
        match error {
            ModelError::Validation(msg) => {
                ModelError::Validation(format!("{} (form '{}')", msg, self.name()))
            }
            other => other,
        }
    }
}

/// Validate the complete form set a connector registers
///
/// Every form must belong to `connector_name`; within each form type the
/// indices must be unique, contiguous and zero-based, and names unique.
pub fn validate_form_set(connector_name: &str, forms: &[Form]) -> Result<()> {
    let mut by_type: BTreeMap<FormType, Vec<&Form>> = BTreeMap::new();

    for form in forms {
        if form.connector_name() != connector_name {
            return Err(ModelError::schema_integrity(format!(
                "Form '{}' references connector '{}' but is registered under '{}'",
                form.name(),
                form.connector_name(),
                connector_name
            )));
        }
        form.validate()?;
        by_type.entry(form.form_type()).or_default().push(form);
    }

    for (form_type, forms) in by_type {
        let mut indices: BTreeMap<u16, &str> = BTreeMap::new();
        let mut names = HashSet::new();

        for form in forms {
            if let Some(existing) = indices.insert(form.index(), form.name()) {
                return Err(ModelError::schema_integrity(format!(
                    "Connector '{}' declares {} forms '{}' and '{}' at the same index {}",
                    connector_name,
                    form_type,
                    existing,
                    form.name(),
                    form.index()
                )));
            }
            if !names.insert(form.name()) {
                return Err(ModelError::schema_integrity(format!(
                    "Connector '{}' declares {} form '{}' twice",
                    connector_name,
                    form_type,
                    form.name()
                )));
            }
        }

        for (expected, (index, name)) in indices.iter().enumerate() {
            if *index as usize != expected {
                return Err(ModelError::schema_integrity(format!(
                    "Connector '{}' {} form '{}' has index {}, expected {}",
                    connector_name, form_type, name, index, expected
                )));
            }
        }
    }

    Ok(())
}
