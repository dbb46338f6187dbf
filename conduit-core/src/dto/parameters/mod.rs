//! Resolved parameters handed to the execution engine

use std::collections::HashMap;

use crate::domain::connection::Connection;
use crate::domain::form::Form;
use crate::domain::job::Job;

/// Resolved values keyed `"<form>.<input>"`
pub type ParameterSet = HashMap<String, serde_json::Value>;

/// Flatten the values of a connection and, optionally, a job
///
/// Unset inputs are omitted. Job values are applied after connection values.
pub fn resolve_parameters(connection: &Connection, job: Option<&Job>) -> ParameterSet {
    let mut parameters = ParameterSet::new();
    collect_form_values(&connection.forms, &mut parameters);
    if let Some(job) = job {
        collect_form_values(&job.forms, &mut parameters);
    }
    parameters
}

pub fn collect_form_values(forms: &[Form], parameters: &mut ParameterSet) {
    for form in forms {
        for input in form.inputs() {
            if let Some(value) = input.to_json() {
                parameters.insert(format!("{}.{}", form.name(), input.name()), value);
            }
        }
    }
}
