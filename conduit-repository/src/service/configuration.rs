//! Configuration Service
//!
//! Saves and loads connections and jobs. Only inputs that hold a value are
//! stored; loading rebuilds the connector's current forms and restores each
//! stored value through its input's codec.

use chrono::Utc;
use conduit_core::{Connection, Form, FormType, Job, ParameterSet, resolve_parameters};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{RepositoryError, Result};
use crate::repository::value_repository::{self, ValueOwner};
use crate::repository::{connection_repository, job_repository};
use crate::service::registration::{FormLayout, load_form_layout};

/// Create a connection and its values in one transaction
pub async fn create_connection(pool: &SqlitePool, mut connection: Connection) -> Result<Connection> {
    connection.validate()?;

    let mut tx = pool.begin().await?;

    let layout =
        load_form_layout(&mut tx, &connection.connector_name, Some(FormType::Connection)).await?;
    let owner_label = format!("Connection '{}'", connection.name);
    let values = collect_values(&owner_label, &connection.connector_name, &connection.forms, &layout)?;

    let now = Utc::now();
    let id = connection_repository::insert(&mut tx, &connection, now).await?;
    store_values(&mut tx, ValueOwner::Connection(id), &values).await?;

    tx.commit().await?;

    tracing::info!(
        "Connection created: {} ({}) for connector {} with {} values",
        id,
        connection.name,
        connection.connector_name,
        values.len()
    );

    connection.id = Some(id);
    connection.created_at = Some(now);
    connection.updated_at = Some(now);
    Ok(connection)
}

/// Load a connection with its forms and decoded values
///
/// # Errors
/// `NotFound` for an unknown id; `MalformedValue` naming `form.input` when a
/// stored value no longer decodes.
pub async fn load_connection(pool: &SqlitePool, id: i64) -> Result<Connection> {
    let mut conn = pool.acquire().await?;
    load_connection_with(&mut conn, id).await
}

/// Delete a connection and its values; fails while jobs still use it
pub async fn delete_connection(pool: &SqlitePool, id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;

    value_repository::delete_all(&mut tx, ValueOwner::Connection(id)).await?;
    if !connection_repository::delete(&mut tx, id).await? {
        return Err(RepositoryError::NotFound(format!("Connection {}", id)));
    }

    tx.commit().await?;

    tracing::info!("Connection deleted: {}", id);
    Ok(())
}

/// Create a job and its values in one transaction
pub async fn create_job(pool: &SqlitePool, mut job: Job) -> Result<Job> {
    let mut tx = pool.begin().await?;

    let connection = connection_repository::find_by_id(&mut tx, job.connection_id)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("Connection {}", job.connection_id)))?;
    job.validate(&connection.connector_name)?;

    let layout =
        load_form_layout(&mut tx, &connection.connector_name, Some(FormType::Job)).await?;
    let owner_label = format!("Job '{}'", job.name);
    let values = collect_values(&owner_label, &connection.connector_name, &job.forms, &layout)?;

    let now = Utc::now();
    let id = job_repository::insert(&mut tx, &job, now).await?;
    store_values(&mut tx, ValueOwner::Job(id), &values).await?;

    tx.commit().await?;

    tracing::info!(
        "Job created: {} ({}) on connection {} with {} values",
        id,
        job.name,
        job.connection_id,
        values.len()
    );

    job.id = Some(id);
    job.created_at = Some(now);
    job.updated_at = Some(now);
    Ok(job)
}

/// Load a job with its forms and decoded values
pub async fn load_job(pool: &SqlitePool, id: i64) -> Result<Job> {
    let mut conn = pool.acquire().await?;
    load_job_with(&mut conn, id).await
}

/// Delete a job and its values
pub async fn delete_job(pool: &SqlitePool, id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;

    value_repository::delete_all(&mut tx, ValueOwner::Job(id)).await?;
    if !job_repository::delete(&mut tx, id).await? {
        return Err(RepositoryError::NotFound(format!("Job {}", id)));
    }

    tx.commit().await?;

    tracing::info!("Job deleted: {}", id);
    Ok(())
}

/// Resolve the parameters of a stored job and its connection
pub async fn resolve_job_parameters(pool: &SqlitePool, job_id: i64) -> Result<ParameterSet> {
    let mut conn = pool.acquire().await?;

    let job = load_job_with(&mut conn, job_id).await?;
    let connection = load_connection_with(&mut conn, job.connection_id).await?;

    Ok(resolve_parameters(&connection, Some(&job)))
}

// =============================================================================
// Helpers
// =============================================================================

async fn load_connection_with(conn: &mut SqliteConnection, id: i64) -> Result<Connection> {
    let record = connection_repository::find_by_id(conn, id)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("Connection {}", id)))?;

    let layout =
        load_form_layout(conn, &record.connector_name, Some(FormType::Connection)).await?;
    let forms = restore_values(conn, ValueOwner::Connection(id), layout).await?;

    Ok(Connection {
        id: Some(record.id),
        name: record.name,
        connector_name: record.connector_name,
        forms,
        created_at: Some(record.created_at),
        updated_at: Some(record.updated_at),
    })
}

async fn load_job_with(conn: &mut SqliteConnection, id: i64) -> Result<Job> {
    let record = job_repository::find_by_id(conn, id)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("Job {}", id)))?;
    let connection = connection_repository::find_by_id(conn, record.connection_id)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("Connection {}", record.connection_id)))?;

    let layout = load_form_layout(conn, &connection.connector_name, Some(FormType::Job)).await?;
    let forms = restore_values(conn, ValueOwner::Job(id), layout).await?;

    Ok(Job {
        id: Some(record.id),
        name: record.name,
        connection_id: record.connection_id,
        forms,
        created_at: Some(record.created_at),
        updated_at: Some(record.updated_at),
    })
}

/// Map every set input to its stored declaration and encoded value
///
/// Each value is checked against the stored declaration, not the caller's
/// copy of the form, so nothing is written that a later load would refuse.
fn collect_values(
    owner: &str,
    connector_name: &str,
    forms: &[Form],
    layout: &FormLayout,
) -> Result<Vec<(i64, String)>> {
    let mut values = Vec::new();

    for form in forms {
        for input in form.inputs().iter().filter(|input| input.has_value()) {
            let undeclared = || {
                RepositoryError::schema_integrity(format!(
                    "{} sets input '{}.{}' which connector '{}' does not declare",
                    owner,
                    form.name(),
                    input.name(),
                    connector_name
                ))
            };

            let declared = layout.form(form.name()).ok_or_else(undeclared)?;
            let input_id = layout
                .input_id(form.name(), input.name())
                .ok_or_else(undeclared)?;
            declared.check_value(input)?;

            values.push((input_id, input.to_url_safe_string()));
        }
    }

    Ok(values)
}

async fn store_values(
    conn: &mut SqliteConnection,
    owner: ValueOwner,
    values: &[(i64, String)],
) -> Result<()> {
    for (input_id, value) in values {
        value_repository::insert(conn, owner, *input_id, value).await?;
    }
    Ok(())
}

async fn restore_values(
    conn: &mut SqliteConnection,
    owner: ValueOwner,
    layout: FormLayout,
) -> Result<Vec<Form>> {
    let stored = value_repository::list(conn, owner).await?;

    let mut assignments = Vec::with_capacity(stored.len());
    for value in stored {
        let (position, input_name) = layout.locate(value.input_id).ok_or_else(|| {
            RepositoryError::schema_integrity(format!(
                "Stored value references input {} outside the connector's forms",
                value.input_id
            ))
        })?;
        assignments.push((position, input_name, value.value));
    }

    let mut forms = layout.forms;
    for (position, input_name, encoded) in assignments {
        forms[position].restore_input(&input_name, &encoded)?;
    }

    Ok(forms)
}
