//! Form Repository
//!
//! Handles all database operations related to forms.

use conduit_core::{Form, FormType, ModelError};
use sqlx::SqliteConnection;

use crate::error::{RepositoryError, Result};
use crate::repository::connector_repository;

/// A persisted form row (inputs live in their own table)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRecord {
    pub id: i64,
    pub connector_name: String,
    pub name: String,
    pub form_type: FormType,
    pub index: u16,
}

/// Insert a form row and return its generated id
///
/// The owning connector must already exist; nothing is written otherwise.
pub async fn insert(conn: &mut SqliteConnection, form: &Form) -> Result<i64> {
    form.validate()?;

    if !connector_repository::exists(conn, form.connector_name()).await? {
        return Err(RepositoryError::schema_integrity(format!(
            "Form '{}' references non-existent connector '{}'",
            form.name(),
            form.connector_name()
        )));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO form (connector_name, name, form_type, form_index)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(form.connector_name())
    .bind(form.name())
    .bind(form.form_type().as_str())
    .bind(form.index() as i64)
    .execute(&mut *conn)
    .await?;

    let id = result.last_insert_rowid();
    tracing::debug!(
        "Form row written: {}/{} {} #{} (id {})",
        form.connector_name(),
        form.form_type(),
        form.name(),
        form.index(),
        id
    );
    Ok(id)
}

pub async fn exists(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM form WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(found.is_some())
}

/// List a connector's forms, CONNECTION forms first, each type by index
pub async fn list_by_connector(
    conn: &mut SqliteConnection,
    connector_name: &str,
) -> Result<Vec<FormRecord>> {
    let rows = sqlx::query_as::<_, FormRow>(
        r#"
        SELECT id, connector_name, name, form_type, form_index
        FROM form
        WHERE connector_name = $1
        ORDER BY form_type ASC, form_index ASC
        "#,
    )
    .bind(connector_name)
    .fetch_all(&mut *conn)
    .await?;

    let records = rows
        .into_iter()
        .map(FormRecord::try_from)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(records)
}

/// List a connector's forms of one type, by index
pub async fn list_by_connector_and_type(
    conn: &mut SqliteConnection,
    connector_name: &str,
    form_type: FormType,
) -> Result<Vec<FormRecord>> {
    let rows = sqlx::query_as::<_, FormRow>(
        r#"
        SELECT id, connector_name, name, form_type, form_index
        FROM form
        WHERE connector_name = $1 AND form_type = $2
        ORDER BY form_index ASC
        "#,
    )
    .bind(connector_name)
    .bind(form_type.as_str())
    .fetch_all(&mut *conn)
    .await?;

    let records = rows
        .into_iter()
        .map(FormRecord::try_from)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(records)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct FormRow {
    id: i64,
    connector_name: String,
    name: String,
    form_type: String,
    form_index: i64,
}

impl TryFrom<FormRow> for FormRecord {
    type Error = ModelError;

    fn try_from(row: FormRow) -> std::result::Result<Self, ModelError> {
        let index = u16::try_from(row.form_index).map_err(|_| {
            ModelError::validation(format!(
                "Form '{}' has invalid stored index {}",
                row.name, row.form_index
            ))
        })?;

        Ok(FormRecord {
            id: row.id,
            form_type: row.form_type.parse()?,
            connector_name: row.connector_name,
            name: row.name,
            index,
        })
    }
}
