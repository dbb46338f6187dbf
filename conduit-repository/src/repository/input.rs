//! Input Repository
//!
//! Handles all database operations related to input declarations.

use conduit_core::domain::element::MAX_SMALLINT;
use conduit_core::{FormInput, InputDescriptor, ModelError};
use sqlx::SqliteConnection;

use crate::error::{RepositoryError, Result};
use crate::repository::form_repository;

/// A persisted input declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRecord {
    pub id: i64,
    pub form_id: i64,
    pub index: u16,
    pub descriptor: InputDescriptor,
}

/// Insert an input declaration at `index` within its form
pub async fn insert(
    conn: &mut SqliteConnection,
    form_id: i64,
    index: u16,
    input: &FormInput,
) -> Result<i64> {
    input.validate_declaration()?;
    if index > MAX_SMALLINT {
        return Err(ModelError::validation(format!(
            "Input '{}' index {} exceeds {}",
            input.name(),
            index,
            MAX_SMALLINT
        ))
        .into());
    }

    if !form_repository::exists(conn, form_id).await? {
        return Err(RepositoryError::schema_integrity(format!(
            "Input '{}' references non-existent form {}",
            input.name(),
            form_id
        )));
    }

    let descriptor = input.descriptor();
    let result = sqlx::query(
        r#"
        INSERT INTO input (name, form_id, input_index, input_type, mask_sensitive, max_length)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(&descriptor.name)
    .bind(form_id)
    .bind(index as i64)
    .bind(descriptor.input_type.as_str())
    .bind(descriptor.sensitive)
    .bind(descriptor.max_length.map(|max| max as i64))
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// List a form's inputs by index
pub async fn list_by_form(conn: &mut SqliteConnection, form_id: i64) -> Result<Vec<InputRecord>> {
    let rows = sqlx::query_as::<_, InputRow>(
        r#"
        SELECT id, name, form_id, input_index, input_type, mask_sensitive, max_length
        FROM input
        WHERE form_id = $1
        ORDER BY input_index ASC
        "#,
    )
    .bind(form_id)
    .fetch_all(&mut *conn)
    .await?;

    collect_records(rows)
}

/// List the inputs of every form of a connector, grouped by form
pub async fn list_by_connector(
    conn: &mut SqliteConnection,
    connector_name: &str,
) -> Result<Vec<InputRecord>> {
    let rows = sqlx::query_as::<_, InputRow>(
        r#"
        SELECT i.id, i.name, i.form_id, i.input_index, i.input_type,
               i.mask_sensitive, i.max_length
        FROM input i
        JOIN form f ON f.id = i.form_id
        WHERE f.connector_name = $1
        ORDER BY i.form_id ASC, i.input_index ASC
        "#,
    )
    .bind(connector_name)
    .fetch_all(&mut *conn)
    .await?;

    collect_records(rows)
}

fn collect_records(rows: Vec<InputRow>) -> Result<Vec<InputRecord>> {
    let records = rows
        .into_iter()
        .map(InputRecord::try_from)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(records)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct InputRow {
    id: i64,
    name: String,
    form_id: i64,
    input_index: i64,
    input_type: String,
    mask_sensitive: bool,
    max_length: Option<i64>,
}

impl TryFrom<InputRow> for InputRecord {
    type Error = ModelError;

    fn try_from(row: InputRow) -> std::result::Result<Self, ModelError> {
        let index = u16::try_from(row.input_index).map_err(|_| {
            ModelError::validation(format!(
                "Input '{}' has invalid stored index {}",
                row.name, row.input_index
            ))
        })?;
        let max_length = row
            .max_length
            .map(|max| {
                u16::try_from(max).map_err(|_| {
                    ModelError::validation(format!(
                        "Input '{}' has invalid stored max length {}",
                        row.name, max
                    ))
                })
            })
            .transpose()?;

        Ok(InputRecord {
            id: row.id,
            form_id: row.form_id,
            index,
            descriptor: InputDescriptor {
                input_type: row.input_type.parse()?,
                name: row.name,
                sensitive: row.mask_sensitive,
                max_length,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::connector_repository;
    use crate::test_support::{initialized_repository, mysql_forms, mysql_registration};

    #[tokio::test]
    async fn test_input_of_unknown_form_is_rejected() {
        let repo = initialized_repository().await;
        let mut conn = repo.pool.acquire().await.unwrap();

        let forms = mysql_forms();
        let err = insert(&mut conn, 42, 0, &forms[0].inputs()[0]).await.unwrap_err();
        assert!(err.is_schema_integrity());
    }

    #[tokio::test]
    async fn test_declarations_round_trip() {
        let repo = initialized_repository().await;
        let mut conn = repo.pool.acquire().await.unwrap();

        connector_repository::insert(&mut conn, &mysql_registration())
            .await
            .unwrap();
        let form = &mysql_forms()[0];
        let form_id = form_repository::insert(&mut conn, form).await.unwrap();
        for (index, input) in form.inputs().iter().enumerate() {
            insert(&mut conn, form_id, index as u16, input).await.unwrap();
        }

        let records = list_by_form(&mut conn, form_id).await.unwrap();
        let descriptors: Vec<InputDescriptor> =
            records.into_iter().map(|r| r.descriptor).collect();
        let expected: Vec<InputDescriptor> =
            form.inputs().iter().map(FormInput::descriptor).collect();
        assert_eq!(descriptors, expected);

        let by_connector = list_by_connector(&mut conn, "jdbc-mysql").await.unwrap();
        assert_eq!(by_connector.len(), form.inputs().len());
    }

    #[tokio::test]
    async fn test_overlong_input_name_is_rejected_before_write() {
        let repo = initialized_repository().await;
        let mut conn = repo.pool.acquire().await.unwrap();

        let input: FormInput = conduit_core::StringInput::new("x".repeat(65)).into();
        let err = insert(&mut conn, 1, 0, &input).await.unwrap_err();
        assert!(err.is_validation());
    }
}
