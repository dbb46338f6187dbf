//! Shared fixtures for repository tests

use conduit_core::{
    BooleanInput, ConnectorRegistration, Form, FormType, IntegerInput, MapInput, StringInput,
    StringKind,
};
use sqlx::SqlitePool;
use tempfile::TempDir;

use crate::config::Config;
use crate::db;
use crate::schema;

/// A pool over a repository file that lives as long as the fixture
pub struct TestRepository {
    pub pool: SqlitePool,
    _dir: TempDir,
}

/// Empty store with no schema
pub async fn fresh_repository() -> TestRepository {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("repository.db").display());
    let pool = db::create_pool(&Config::new(url)).await.unwrap();
    TestRepository { pool, _dir: dir }
}

/// Store with the current schema created
pub async fn initialized_repository() -> TestRepository {
    let repo = fresh_repository().await;
    schema::create_schema(&repo.pool).await.unwrap();
    repo
}

pub fn mysql_registration() -> ConnectorRegistration {
    ConnectorRegistration::new("jdbc-mysql", "org.conduit.connector.jdbc.MySqlConnector").unwrap()
}

/// Forms of the `jdbc-mysql` connector, sorted by type and index
pub fn mysql_forms() -> Vec<Form> {
    vec![
        Form::new(
            "jdbc-mysql",
            "connection",
            FormType::Connection,
            0,
            vec![
                StringInput::with_kind("url", StringKind::new().with_max_length(255)).into(),
                IntegerInput::new("port").into(),
                StringInput::with_kind("password", StringKind::new().masked()).into(),
                MapInput::new("properties").into(),
            ],
        ),
        Form::new(
            "jdbc-mysql",
            "security",
            FormType::Connection,
            1,
            vec![BooleanInput::new("ssl").into()],
        ),
        Form::new(
            "jdbc-mysql",
            "table",
            FormType::Job,
            0,
            vec![
                StringInput::with_kind("name", StringKind::new().with_max_length(64)).into(),
                BooleanInput::new("truncate").into(),
                IntegerInput::new("batch_size").into(),
            ],
        ),
    ]
}
