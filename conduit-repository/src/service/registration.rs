//! Registration Service
//!
//! Connector registration and form metadata lookup.

use std::collections::HashMap;

use conduit_core::domain::form::validate_form_set;
use conduit_core::{ConnectorRegistration, Form, FormInput, FormType};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{RepositoryError, Result};
use crate::repository::{connector_repository, form_repository, input_repository};

/// What a registration did to the stored rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RegistrationOutcome {
    /// Connector and forms were written
    Created,
    /// Same form structure, new implementation class
    Updated,
    /// Identical registration, nothing written
    Unchanged,
}

/// A connector together with its stored form layout
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredConnector {
    pub registration: ConnectorRegistration,
    pub forms: Vec<Form>,
    pub outcome: RegistrationOutcome,
}

/// Register a connector and its forms in one transaction
///
/// Registering a known connector with the same form structure updates its
/// implementation class; a different structure is rejected and the stored
/// rows are left untouched.
///
/// # Errors
/// `Validation` or `SchemaIntegrity` when the registration is invalid, in
/// which case nothing is written.
pub async fn register_connector(
    pool: &SqlitePool,
    registration: ConnectorRegistration,
    mut forms: Vec<Form>,
) -> Result<RegisteredConnector> {
    registration.validate()?;
    validate_form_set(registration.name(), &forms)?;

    forms.sort_by_key(|form| (form.form_type(), form.index()));
    for form in &mut forms {
        form.clear_values();
    }

    let mut tx = pool.begin().await?;

    let outcome = match connector_repository::find_by_name(&mut tx, registration.name()).await? {
        None => {
            connector_repository::insert(&mut tx, &registration).await?;
            for form in &forms {
                insert_form(&mut tx, form).await?;
            }
            RegistrationOutcome::Created
        }
        Some(existing) => {
            let stored = load_forms(&mut tx, registration.name()).await?;
            if !same_form_structure(&stored, &forms) {
                return Err(RepositoryError::schema_integrity(format!(
                    "Connector '{}' is already registered with a different form structure",
                    registration.name()
                )));
            }

            if existing.implementation_class() == registration.implementation_class() {
                RegistrationOutcome::Unchanged
            } else {
                connector_repository::update_implementation_class(&mut tx, &registration).await?;
                RegistrationOutcome::Updated
            }
        }
    };

    tx.commit().await?;

    tracing::info!(
        "Connector registered: {} ({}, {} forms, {:?})",
        registration.name(),
        registration.implementation_class(),
        forms.len(),
        outcome
    );

    Ok(RegisteredConnector {
        registration,
        forms,
        outcome,
    })
}

/// Get a connector's forms, CONNECTION forms first, each type by index
pub async fn get_forms(pool: &SqlitePool, connector_name: &str) -> Result<Vec<Form>> {
    let mut conn = pool.acquire().await?;

    if !connector_repository::exists(&mut conn, connector_name).await? {
        return Err(RepositoryError::NotFound(format!(
            "Connector '{}'",
            connector_name
        )));
    }

    load_forms(&mut conn, connector_name).await
}

/// Get a connector registration by name
pub async fn get_connector(pool: &SqlitePool, name: &str) -> Result<ConnectorRegistration> {
    let mut conn = pool.acquire().await?;

    connector_repository::find_by_name(&mut conn, name)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("Connector '{}'", name)))
}

/// List all registered connectors
pub async fn list_connectors(pool: &SqlitePool) -> Result<Vec<ConnectorRegistration>> {
    let mut conn = pool.acquire().await?;
    connector_repository::list_all(&mut conn).await
}

// =============================================================================
// Form Layout
// =============================================================================

/// Stored forms of a connector with the id of every input declaration
#[derive(Debug)]
pub(crate) struct FormLayout {
    pub forms: Vec<Form>,
    /// Parallel to `forms[i].inputs()`
    input_ids: Vec<Vec<i64>>,
}

impl FormLayout {
    /// Stored declaration of a form
    pub fn form(&self, form_name: &str) -> Option<&Form> {
        self.forms.iter().find(|form| form.name() == form_name)
    }

    pub fn input_id(&self, form_name: &str, input_name: &str) -> Option<i64> {
        let position = self.forms.iter().position(|form| form.name() == form_name)?;
        let input = self.forms[position]
            .inputs()
            .iter()
            .position(|input| input.name() == input_name)?;
        Some(self.input_ids[position][input])
    }

    /// Form position and input name of a stored input id
    pub fn locate(&self, input_id: i64) -> Option<(usize, String)> {
        self.input_ids.iter().enumerate().find_map(|(position, ids)| {
            let input = ids.iter().position(|id| *id == input_id)?;
            Some((
                position,
                self.forms[position].inputs()[input].name().to_string(),
            ))
        })
    }
}

/// Load the stored layout of a connector, optionally restricted to one type
pub(crate) async fn load_form_layout(
    conn: &mut SqliteConnection,
    connector_name: &str,
    form_type: Option<FormType>,
) -> Result<FormLayout> {
    let records = match form_type {
        Some(form_type) => {
            form_repository::list_by_connector_and_type(conn, connector_name, form_type).await?
        }
        None => form_repository::list_by_connector(conn, connector_name).await?,
    };

    let mut inputs_by_form: HashMap<i64, Vec<_>> = HashMap::new();
    for input in input_repository::list_by_connector(conn, connector_name).await? {
        inputs_by_form.entry(input.form_id).or_default().push(input);
    }

    let mut forms = Vec::with_capacity(records.len());
    let mut input_ids = Vec::with_capacity(records.len());
    for record in records {
        let inputs = inputs_by_form.remove(&record.id).unwrap_or_default();
        input_ids.push(inputs.iter().map(|input| input.id).collect());
        forms.push(Form::new(
            record.connector_name,
            record.name,
            record.form_type,
            record.index,
            inputs
                .iter()
                .map(|input| FormInput::from_descriptor(&input.descriptor))
                .collect(),
        ));
    }

    Ok(FormLayout { forms, input_ids })
}

pub(crate) async fn load_forms(conn: &mut SqliteConnection, connector_name: &str) -> Result<Vec<Form>> {
    Ok(load_form_layout(conn, connector_name, None).await?.forms)
}

async fn insert_form(conn: &mut SqliteConnection, form: &Form) -> Result<()> {
    let form_id = form_repository::insert(conn, form).await?;
    for (index, input) in form.inputs().iter().enumerate() {
        input_repository::insert(conn, form_id, index as u16, input).await?;
    }
    Ok(())
}

/// Both sets must be sorted by type and index
fn same_form_structure(stored: &[Form], requested: &[Form]) -> bool {
    stored.len() == requested.len()
        && stored
            .iter()
            .zip(requested)
            .all(|(a, b)| a.same_structure(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{initialized_repository, mysql_forms, mysql_registration};
    use conduit_core::{IntegerInput, StringInput};

    async fn count(pool: &SqlitePool, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_and_get_forms() {
        let repo = initialized_repository().await;

        let registered = register_connector(&repo.pool, mysql_registration(), mysql_forms())
            .await
            .unwrap();
        assert_eq!(registered.outcome, RegistrationOutcome::Created);

        let forms = get_forms(&repo.pool, "jdbc-mysql").await.unwrap();
        assert_eq!(forms, mysql_forms());
        assert_eq!(forms, registered.forms);
    }

    #[tokio::test]
    async fn test_colliding_connection_forms_write_nothing() {
        let repo = initialized_repository().await;

        let forms = vec![
            Form::new(
                "jdbc-mysql",
                "connection",
                FormType::Connection,
                0,
                vec![StringInput::new("url").into()],
            ),
            Form::new(
                "jdbc-mysql",
                "security",
                FormType::Connection,
                0,
                vec![IntegerInput::new("timeout").into()],
            ),
        ];

        let err = register_connector(&repo.pool, mysql_registration(), forms)
            .await
            .unwrap_err();
        assert!(err.is_schema_integrity());
        assert!(err.to_string().contains("jdbc-mysql"));

        assert_eq!(count(&repo.pool, "connector").await, 0);
        assert_eq!(count(&repo.pool, "form").await, 0);
        assert_eq!(count(&repo.pool, "input").await, 0);
    }

    #[tokio::test]
    async fn test_form_of_other_connector_is_rejected_before_write() {
        let repo = initialized_repository().await;

        let mut forms = mysql_forms();
        forms.push(Form::new("jdbc-oracle", "extra", FormType::Job, 1, vec![]));

        let err = register_connector(&repo.pool, mysql_registration(), forms)
            .await
            .unwrap_err();
        assert!(err.is_schema_integrity());
        assert!(err.to_string().contains("jdbc-oracle"));
        assert_eq!(count(&repo.pool, "connector").await, 0);
    }

    #[tokio::test]
    async fn test_overlong_input_name_is_rejected_before_write() {
        let repo = initialized_repository().await;

        let forms = vec![Form::new(
            "jdbc-mysql",
            "connection",
            FormType::Connection,
            0,
            vec![StringInput::new("u".repeat(65)).into()],
        )];

        let err = register_connector(&repo.pool, mysql_registration(), forms)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(count(&repo.pool, "connector").await, 0);
    }

    #[tokio::test]
    async fn test_reregistration_updates_implementation_class() {
        let repo = initialized_repository().await;
        register_connector(&repo.pool, mysql_registration(), mysql_forms())
            .await
            .unwrap();

        let again = register_connector(&repo.pool, mysql_registration(), mysql_forms())
            .await
            .unwrap();
        assert_eq!(again.outcome, RegistrationOutcome::Unchanged);

        let upgraded = ConnectorRegistration::new("jdbc-mysql", "org.conduit.connector.jdbc.MySqlV2")
            .unwrap();
        let updated = register_connector(&repo.pool, upgraded, mysql_forms())
            .await
            .unwrap();
        assert_eq!(updated.outcome, RegistrationOutcome::Updated);

        let stored = get_connector(&repo.pool, "jdbc-mysql").await.unwrap();
        assert_eq!(stored.implementation_class(), "org.conduit.connector.jdbc.MySqlV2");
        assert_eq!(count(&repo.pool, "form").await, mysql_forms().len() as i64);
    }

    #[tokio::test]
    async fn test_reregistration_with_new_structure_is_rejected() {
        let repo = initialized_repository().await;
        register_connector(&repo.pool, mysql_registration(), mysql_forms())
            .await
            .unwrap();
        let inputs_before = count(&repo.pool, "input").await;

        let mut forms = mysql_forms();
        forms.truncate(1);
        let err = register_connector(&repo.pool, mysql_registration(), forms)
            .await
            .unwrap_err();
        assert!(err.is_schema_integrity());

        assert_eq!(get_forms(&repo.pool, "jdbc-mysql").await.unwrap(), mysql_forms());
        assert_eq!(count(&repo.pool, "input").await, inputs_before);
    }

    #[tokio::test]
    async fn test_concurrent_registrations_leave_one_row_set() {
        let repo = initialized_repository().await;

        let (first, second) = tokio::join!(
            register_connector(&repo.pool, mysql_registration(), mysql_forms()),
            register_connector(&repo.pool, mysql_registration(), mysql_forms()),
        );
        assert!(first.is_ok() || second.is_ok());

        assert_eq!(count(&repo.pool, "connector").await, 1);
        assert_eq!(count(&repo.pool, "form").await, mysql_forms().len() as i64);
        assert_eq!(get_forms(&repo.pool, "jdbc-mysql").await.unwrap(), mysql_forms());
    }

    #[tokio::test]
    async fn test_unknown_connector() {
        let repo = initialized_repository().await;

        assert!(get_forms(&repo.pool, "jdbc-oracle").await.unwrap_err().is_not_found());
        assert!(get_connector(&repo.pool, "jdbc-oracle").await.unwrap_err().is_not_found());
        assert!(list_connectors(&repo.pool).await.unwrap().is_empty());
    }
}
