//! Job Repository
//!
//! Handles all database operations related to job rows. Values live in
//! `job_input`, see [`crate::repository::value_repository`].

use chrono::{DateTime, Utc};
use conduit_core::Job;
use conduit_core::domain::element::{MAX_NAME_LENGTH, validate_identifier};
use sqlx::SqliteConnection;

use crate::error::{RepositoryError, Result};
use crate::repository::connection_repository;

/// A persisted job row
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct JobRecord {
    pub id: i64,
    pub name: String,
    pub connection_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert a job row and return its generated id
pub async fn insert(conn: &mut SqliteConnection, job: &Job, now: DateTime<Utc>) -> Result<i64> {
    validate_identifier("Job", &job.name, MAX_NAME_LENGTH)?;

    if connection_repository::find_by_id(conn, job.connection_id)
        .await?
        .is_none()
    {
        return Err(RepositoryError::schema_integrity(format!(
            "Job '{}' references non-existent connection {}",
            job.name, job.connection_id
        )));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO job (name, connection_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(&job.name)
    .bind(job.connection_id)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Find a job by id
pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<JobRecord>> {
    let record = sqlx::query_as::<_, JobRecord>(
        r#"
        SELECT id, name, connection_id, created_at, updated_at
        FROM job
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(record)
}

/// List the jobs of a connection, oldest first
pub async fn list_by_connection(
    conn: &mut SqliteConnection,
    connection_id: i64,
) -> Result<Vec<JobRecord>> {
    let records = sqlx::query_as::<_, JobRecord>(
        r#"
        SELECT id, name, connection_id, created_at, updated_at
        FROM job
        WHERE connection_id = $1
        ORDER BY id ASC
        "#,
    )
    .bind(connection_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(records)
}

/// Delete a job row; its values must be removed first
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM job WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}
