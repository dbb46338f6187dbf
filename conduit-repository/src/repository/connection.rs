//! Connection Repository
//!
//! Handles all database operations related to connection rows. Values live
//! in `connection_input`, see [`crate::repository::value_repository`].

use chrono::{DateTime, Utc};
use conduit_core::Connection;
use conduit_core::domain::element::{MAX_NAME_LENGTH, validate_identifier};
use sqlx::SqliteConnection;

use crate::error::{RepositoryError, Result};
use crate::repository::connector_repository;

/// A persisted connection row
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ConnectionRecord {
    pub id: i64,
    pub name: String,
    pub connector_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert a connection row and return its generated id
pub async fn insert(
    conn: &mut SqliteConnection,
    connection: &Connection,
    now: DateTime<Utc>,
) -> Result<i64> {
    validate_identifier("Connection", &connection.name, MAX_NAME_LENGTH)?;

    if !connector_repository::exists(conn, &connection.connector_name).await? {
        return Err(RepositoryError::schema_integrity(format!(
            "Connection '{}' references non-existent connector '{}'",
            connection.name, connection.connector_name
        )));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO connection (name, connector_name, created_at, updated_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(&connection.name)
    .bind(&connection.connector_name)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Find a connection by id
pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<ConnectionRecord>> {
    let record = sqlx::query_as::<_, ConnectionRecord>(
        r#"
        SELECT id, name, connector_name, created_at, updated_at
        FROM connection
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(record)
}

/// List a connector's connections, oldest first
pub async fn list_by_connector(
    conn: &mut SqliteConnection,
    connector_name: &str,
) -> Result<Vec<ConnectionRecord>> {
    let records = sqlx::query_as::<_, ConnectionRecord>(
        r#"
        SELECT id, name, connector_name, created_at, updated_at
        FROM connection
        WHERE connector_name = $1
        ORDER BY id ASC
        "#,
    )
    .bind(connector_name)
    .fetch_all(&mut *conn)
    .await?;

    Ok(records)
}

/// Delete a connection row; its values must be removed first
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM connection WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}
