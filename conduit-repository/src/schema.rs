//! Repository Schema
//!
//! The DDL is a fixed artifact per schema version. Creation runs once per
//! fresh repository; invoking it on an initialized repository is an error,
//! never a silent no-op.
//!
//! ```text
//!  connector (name PK) 1──N form (id PK) 1──N input (id PK)
//!        │                                    │
//!        1──N connection (id PK) 1──N job     │
//!                  │                   │      │
//!                  N──connection_input─┼──────N
//!                                      N──job_input──N
//! ```

use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{RepositoryError, Result};

/// Version written by [`create_schema`]
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_V1: &[&str] = &[
    r#"
    CREATE TABLE repository_version (
        version INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE connector (
        name VARCHAR(64) NOT NULL PRIMARY KEY,
        implementation_class VARCHAR(255) NOT NULL
    )
    "#,
    r#"
    CREATE TABLE form (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        connector_name VARCHAR(64) NOT NULL REFERENCES connector(name),
        name VARCHAR(64) NOT NULL,
        form_type VARCHAR(32) NOT NULL CHECK (form_type IN ('CONNECTION', 'JOB')),
        form_index SMALLINT NOT NULL CHECK (form_index >= 0),
        UNIQUE (connector_name, form_type, form_index)
    )
    "#,
    r#"
    CREATE TABLE input (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name VARCHAR(64) NOT NULL,
        form_id INTEGER NOT NULL REFERENCES form(id),
        input_index SMALLINT NOT NULL CHECK (input_index >= 0),
        input_type VARCHAR(32) NOT NULL
            CHECK (input_type IN ('STRING', 'MAP', 'INTEGER', 'BOOLEAN')),
        mask_sensitive BOOLEAN NOT NULL DEFAULT FALSE,
        max_length SMALLINT,
        UNIQUE (form_id, input_index)
    )
    "#,
    r#"
    CREATE TABLE connection (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name VARCHAR(64) NOT NULL,
        connector_name VARCHAR(64) NOT NULL REFERENCES connector(name),
        created_at DATETIME NOT NULL,
        updated_at DATETIME NOT NULL
    )
    "#,
    r#"
    CREATE TABLE job (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name VARCHAR(64) NOT NULL,
        connection_id INTEGER NOT NULL REFERENCES connection(id),
        created_at DATETIME NOT NULL,
        updated_at DATETIME NOT NULL
    )
    "#,
    r#"
    CREATE TABLE connection_input (
        connection_id INTEGER NOT NULL REFERENCES connection(id),
        input_id INTEGER NOT NULL REFERENCES input(id),
        value TEXT NOT NULL,
        PRIMARY KEY (connection_id, input_id)
    )
    "#,
    r#"
    CREATE TABLE job_input (
        job_id INTEGER NOT NULL REFERENCES job(id),
        input_id INTEGER NOT NULL REFERENCES input(id),
        value TEXT NOT NULL,
        PRIMARY KEY (job_id, input_id)
    )
    "#,
    "CREATE INDEX idx_connection_connector ON connection(connector_name)",
    "CREATE INDEX idx_job_connection ON job(connection_id)",
];

/// DDL statements of a schema version
pub fn ddl(version: u32) -> Option<&'static [&'static str]> {
    match version {
        1 => Some(SCHEMA_V1),
        _ => None,
    }
}

/// Outcome of [`ensure_schema`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchemaStatus {
    Created,
    Current,
}

/// Schema version of the repository, `None` when it was never initialized
///
/// # Errors
/// `CorruptSchema` when the version table exists but is empty;
/// `UnsupportedVersion` when the stored version is out of range.
pub async fn detect_version(conn: &mut SqliteConnection) -> Result<Option<u32>> {
    let table: Option<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'repository_version'",
    )
    .fetch_optional(&mut *conn)
    .await?;

    if table.is_none() {
        return Ok(None);
    }

    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM repository_version")
        .fetch_one(&mut *conn)
        .await?;

    let version = version.ok_or_else(|| {
        RepositoryError::CorruptSchema("repository_version table holds no version".to_string())
    })?;

    u32::try_from(version)
        .map(Some)
        .map_err(|_| RepositoryError::UnsupportedVersion(version))
}

/// Create every table of the current schema version in one transaction
///
/// # Errors
/// Returns `AlreadyInitialized` when the repository already has a schema. A
/// concurrent creator that loses the race gets a `Persistence` error and its
/// transaction is rolled back.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    let statements = ddl(SCHEMA_VERSION)
        .ok_or(RepositoryError::UnsupportedVersion(i64::from(SCHEMA_VERSION)))?;

    let mut tx = pool.begin().await?;

    if let Some(version) = detect_version(&mut tx).await? {
        return Err(RepositoryError::AlreadyInitialized(version));
    }

    for statement in statements {
        sqlx::query(statement).execute(&mut *tx).await?;
    }

    sqlx::query("INSERT INTO repository_version (version) VALUES ($1)")
        .bind(SCHEMA_VERSION as i64)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!("Repository schema version {} created", SCHEMA_VERSION);
    Ok(())
}

/// Probe the repository and create the schema when it is absent
///
/// # Errors
/// `NotInitialized` when the schema is absent and `create` is false;
/// `UnsupportedVersion` when the repository was created by another version;
/// `CorruptSchema` when the version table is empty.
pub async fn ensure_schema(pool: &SqlitePool, create: bool) -> Result<SchemaStatus> {
    let version = {
        let mut conn = pool.acquire().await?;
        detect_version(&mut conn).await?
    };

    match version {
        Some(SCHEMA_VERSION) => {
            tracing::info!("Repository schema is at version {}", SCHEMA_VERSION);
            Ok(SchemaStatus::Current)
        }
        Some(other) => Err(RepositoryError::UnsupportedVersion(i64::from(other))),
        None if create => {
            create_schema(pool).await?;
            Ok(SchemaStatus::Created)
        }
        None => Err(RepositoryError::NotInitialized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::connector_repository;
    use crate::test_support::{fresh_repository, mysql_registration};

    #[test]
    fn test_ddl_is_versioned() {
        assert_eq!(ddl(SCHEMA_VERSION).map(<[&str]>::len), Some(SCHEMA_V1.len()));
        assert!(ddl(SCHEMA_VERSION + 1).is_none());
    }

    #[tokio::test]
    async fn test_fresh_repository_has_no_version() {
        let repo = fresh_repository().await;
        let mut conn = repo.pool.acquire().await.unwrap();
        assert_eq!(detect_version(&mut conn).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_schema_twice_fails() {
        let repo = fresh_repository().await;
        create_schema(&repo.pool).await.unwrap();

        let mut conn = repo.pool.acquire().await.unwrap();
        connector_repository::insert(&mut conn, &mysql_registration())
            .await
            .unwrap();
        drop(conn);

        let err = create_schema(&repo.pool).await.unwrap_err();
        assert!(matches!(err, RepositoryError::AlreadyInitialized(SCHEMA_VERSION)));

        let mut conn = repo.pool.acquire().await.unwrap();
        assert_eq!(detect_version(&mut conn).await.unwrap(), Some(SCHEMA_VERSION));
        let stored = connector_repository::find_by_name(&mut conn, "jdbc-mysql")
            .await
            .unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn test_ensure_schema() {
        let repo = fresh_repository().await;

        let err = ensure_schema(&repo.pool, false).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotInitialized));

        assert_eq!(
            ensure_schema(&repo.pool, true).await.unwrap(),
            SchemaStatus::Created
        );
        assert_eq!(
            ensure_schema(&repo.pool, true).await.unwrap(),
            SchemaStatus::Current
        );
    }

    #[tokio::test]
    async fn test_unknown_version_is_refused() {
        let repo = fresh_repository().await;
        create_schema(&repo.pool).await.unwrap();
        sqlx::query("UPDATE repository_version SET version = 7")
            .execute(&repo.pool)
            .await
            .unwrap();

        let err = ensure_schema(&repo.pool, true).await.unwrap_err();
        assert!(matches!(err, RepositoryError::UnsupportedVersion(7)));
    }

    #[tokio::test]
    async fn test_out_of_range_version_is_refused() {
        let repo = fresh_repository().await;
        create_schema(&repo.pool).await.unwrap();
        sqlx::query("UPDATE repository_version SET version = -1")
            .execute(&repo.pool)
            .await
            .unwrap();

        let mut conn = repo.pool.acquire().await.unwrap();
        let err = detect_version(&mut conn).await.unwrap_err();
        assert!(matches!(err, RepositoryError::UnsupportedVersion(-1)));
    }

    #[tokio::test]
    async fn test_empty_version_table_is_corrupt() {
        let repo = fresh_repository().await;
        create_schema(&repo.pool).await.unwrap();
        sqlx::query("DELETE FROM repository_version")
            .execute(&repo.pool)
            .await
            .unwrap();

        let err = ensure_schema(&repo.pool, true).await.unwrap_err();
        assert!(matches!(err, RepositoryError::CorruptSchema(_)));

        let err = create_schema(&repo.pool).await.unwrap_err();
        assert!(matches!(err, RepositoryError::CorruptSchema(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_creators_leave_one_schema() {
        let repo = fresh_repository().await;

        let (first, second) = tokio::join!(create_schema(&repo.pool), create_schema(&repo.pool));

        let loser = match (first, second) {
            (Ok(()), Err(err)) | (Err(err), Ok(())) => err,
            other => panic!("expected exactly one creator to succeed: {other:?}"),
        };
        assert!(matches!(
            loser,
            RepositoryError::Persistence(_) | RepositoryError::AlreadyInitialized(SCHEMA_VERSION)
        ));

        let mut conn = repo.pool.acquire().await.unwrap();
        assert_eq!(detect_version(&mut conn).await.unwrap(), Some(SCHEMA_VERSION));
        connector_repository::insert(&mut conn, &mysql_registration())
            .await
            .unwrap();
    }
}
