//! Value Repository
//!
//! Handles the `connection_input` and `job_input` association tables. Values
//! are stored in their URL-safe encoded form and only for inputs that are set.

use sqlx::SqliteConnection;

use crate::error::Result;

/// Configuration entity a value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueOwner {
    Connection(i64),
    Job(i64),
}

impl ValueOwner {
    fn table(&self) -> &'static str {
        match self {
            ValueOwner::Connection(_) => "connection_input",
            ValueOwner::Job(_) => "job_input",
        }
    }

    fn owner_column(&self) -> &'static str {
        match self {
            ValueOwner::Connection(_) => "connection_id",
            ValueOwner::Job(_) => "job_id",
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            ValueOwner::Connection(id) | ValueOwner::Job(id) => *id,
        }
    }
}

/// An encoded value keyed by its input declaration
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StoredValue {
    pub input_id: i64,
    pub value: String,
}

/// Store the encoded value of one input
pub async fn insert(
    conn: &mut SqliteConnection,
    owner: ValueOwner,
    input_id: i64,
    value: &str,
) -> Result<()> {
    let sql = format!(
        "INSERT INTO {} ({}, input_id, value) VALUES ($1, $2, $3)",
        owner.table(),
        owner.owner_column()
    );

    sqlx::query(&sql)
        .bind(owner.id())
        .bind(input_id)
        .bind(value)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// List every stored value of an owner
pub async fn list(conn: &mut SqliteConnection, owner: ValueOwner) -> Result<Vec<StoredValue>> {
    let sql = format!(
        "SELECT input_id, value FROM {} WHERE {} = $1 ORDER BY input_id ASC",
        owner.table(),
        owner.owner_column()
    );

    let values = sqlx::query_as::<_, StoredValue>(&sql)
        .bind(owner.id())
        .fetch_all(&mut *conn)
        .await?;

    Ok(values)
}

/// Remove every stored value of an owner, returning how many were removed
pub async fn delete_all(conn: &mut SqliteConnection, owner: ValueOwner) -> Result<u64> {
    let sql = format!(
        "DELETE FROM {} WHERE {} = $1",
        owner.table(),
        owner.owner_column()
    );

    let result = sqlx::query(&sql)
        .bind(owner.id())
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{connection_repository, connector_repository, form_repository, input_repository};
    use crate::test_support::{initialized_repository, mysql_forms, mysql_registration};
    use chrono::Utc;
    use conduit_core::Connection;

    #[tokio::test]
    async fn test_values_are_scoped_to_owner() {
        let repo = initialized_repository().await;
        let mut conn = repo.pool.acquire().await.unwrap();
        connector_repository::insert(&mut conn, &mysql_registration())
            .await
            .unwrap();
        let form = &mysql_forms()[0];
        let form_id = form_repository::insert(&mut conn, form).await.unwrap();
        let input_id = input_repository::insert(&mut conn, form_id, 0, &form.inputs()[0])
            .await
            .unwrap();

        let connection = Connection::new("warehouse", "jdbc-mysql", vec![]);
        let first = connection_repository::insert(&mut conn, &connection, Utc::now())
            .await
            .unwrap();
        let second = connection_repository::insert(&mut conn, &connection, Utc::now())
            .await
            .unwrap();

        insert(&mut conn, ValueOwner::Connection(first), input_id, "jdbc%3Amysql")
            .await
            .unwrap();

        let stored = list(&mut conn, ValueOwner::Connection(first)).await.unwrap();
        assert_eq!(
            stored,
            vec![StoredValue {
                input_id,
                value: "jdbc%3Amysql".to_string()
            }]
        );
        assert!(list(&mut conn, ValueOwner::Connection(second))
            .await
            .unwrap()
            .is_empty());

        assert_eq!(delete_all(&mut conn, ValueOwner::Connection(first)).await.unwrap(), 1);
        assert!(list(&mut conn, ValueOwner::Connection(first))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_unknown_input_is_rejected_by_store() {
        let repo = initialized_repository().await;
        let mut conn = repo.pool.acquire().await.unwrap();
        connector_repository::insert(&mut conn, &mysql_registration())
            .await
            .unwrap();
        let connection = Connection::new("warehouse", "jdbc-mysql", vec![]);
        let id = connection_repository::insert(&mut conn, &connection, Utc::now())
            .await
            .unwrap();

        assert!(insert(&mut conn, ValueOwner::Connection(id), 404, "x")
            .await
            .is_err());
    }
}
