//! Connector Repository
//!
//! Handles all database operations related to connector registrations.

use conduit_core::{ConnectorRegistration, ModelError};
use sqlx::SqliteConnection;

use crate::error::Result;

/// Insert a connector registration
pub async fn insert(conn: &mut SqliteConnection, registration: &ConnectorRegistration) -> Result<()> {
    registration.validate()?;

    sqlx::query(
        r#"
        INSERT INTO connector (name, implementation_class)
        VALUES ($1, $2)
        "#,
    )
    .bind(registration.name())
    .bind(registration.implementation_class())
    .execute(&mut *conn)
    .await?;

    tracing::debug!("Connector row written: {}", registration.name());
    Ok(())
}

/// Find a connector by name
pub async fn find_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<ConnectorRegistration>> {
    let row = sqlx::query_as::<_, ConnectorRow>(
        r#"
        SELECT name, implementation_class
        FROM connector
        WHERE name = $1
        "#,
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(ConnectorRegistration::try_from).transpose()?)
}

pub async fn exists(conn: &mut SqliteConnection, name: &str) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM connector WHERE name = $1")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(found.is_some())
}

/// List all connectors
pub async fn list_all(conn: &mut SqliteConnection) -> Result<Vec<ConnectorRegistration>> {
    let rows = sqlx::query_as::<_, ConnectorRow>(
        r#"
        SELECT name, implementation_class
        FROM connector
        ORDER BY name ASC
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    let connectors = rows
        .into_iter()
        .map(ConnectorRegistration::try_from)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(connectors)
}

/// Point a registered connector at a new implementation
pub async fn update_implementation_class(
    conn: &mut SqliteConnection,
    registration: &ConnectorRegistration,
) -> Result<bool> {
    registration.validate()?;

    let result = sqlx::query(
        r#"
        UPDATE connector
        SET implementation_class = $1
        WHERE name = $2
        "#,
    )
    .bind(registration.implementation_class())
    .bind(registration.name())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a connector by name
///
/// The store rejects the delete while forms or connections reference it.
pub async fn delete(conn: &mut SqliteConnection, name: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM connector WHERE name = $1")
        .bind(name)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct ConnectorRow {
    name: String,
    implementation_class: String,
}

impl TryFrom<ConnectorRow> for ConnectorRegistration {
    type Error = ModelError;

    fn try_from(row: ConnectorRow) -> std::result::Result<Self, ModelError> {
        ConnectorRegistration::new(row.name, row.implementation_class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepositoryError;
    use crate::repository::form_repository;
    use crate::test_support::{initialized_repository, mysql_forms, mysql_registration};

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = initialized_repository().await;
        let mut conn = repo.pool.acquire().await.unwrap();

        assert!(!exists(&mut conn, "jdbc-mysql").await.unwrap());
        insert(&mut conn, &mysql_registration()).await.unwrap();

        assert!(exists(&mut conn, "jdbc-mysql").await.unwrap());
        let found = find_by_name(&mut conn, "jdbc-mysql").await.unwrap();
        assert_eq!(found, Some(mysql_registration()));
        assert_eq!(find_by_name(&mut conn, "jdbc-oracle").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_primary_key_is_a_persistence_error() {
        let repo = initialized_repository().await;
        let mut conn = repo.pool.acquire().await.unwrap();

        insert(&mut conn, &mysql_registration()).await.unwrap();
        let err = insert(&mut conn, &mysql_registration()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_delete_with_forms_is_rejected_by_foreign_key() {
        let repo = initialized_repository().await;
        let mut conn = repo.pool.acquire().await.unwrap();

        insert(&mut conn, &mysql_registration()).await.unwrap();
        form_repository::insert(&mut conn, &mysql_forms()[0])
            .await
            .unwrap();

        let err = delete(&mut conn, "jdbc-mysql").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Persistence(_)));
        assert!(exists(&mut conn, "jdbc-mysql").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_unreferenced_connector() {
        let repo = initialized_repository().await;
        let mut conn = repo.pool.acquire().await.unwrap();

        insert(&mut conn, &mysql_registration()).await.unwrap();
        assert!(delete(&mut conn, "jdbc-mysql").await.unwrap());
        assert!(!delete(&mut conn, "jdbc-mysql").await.unwrap());
        assert!(list_all(&mut conn).await.unwrap().is_empty());
    }
}
