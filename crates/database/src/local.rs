use crate::error::DbError;
use crate::executor::Executor;
use crate::query::Statement;
use async_trait::async_trait;
use core_types::{Rows, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use std::str::FromStr;
use std::time::Duration;

/// Executes statements against a SQLite database through an `sqlx` pool.
#[derive(Debug, Clone)]
pub struct LocalExecutor {
    pool: SqlitePool,
}

impl LocalExecutor {
    /// Opens a SQLite database file read-only.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str(url)?.read_only(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

        tracing::info!(url = %url, "Opened local SQLite database.");
        Ok(Self { pool })
    }

    /// A private, writable in-memory database (for testing).
    ///
    /// The pool is pinned to one connection that never expires, since every
    /// SQLite in-memory connection is its own database.
    pub async fn in_memory() -> Result<Self, DbError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Executor for LocalExecutor {
    async fn execute(&self, statement: &Statement) -> Result<Rows, DbError> {
        let mut query = sqlx::query(&statement.sql);
        for arg in &statement.args {
            query = match arg {
                Value::Null => query.bind(None::<i64>),
                Value::Integer(i) => query.bind(*i),
                Value::Real(f) => query.bind(*f),
                Value::Text(s) => query.bind(s.as_str()),
                Value::Blob(b) => query.bind(b.as_slice()),
            };
        }

        let rows = query.fetch_all(&self.pool).await?;

        let columns = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let values = rows
            .iter()
            .map(decode_row)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(Rows::new(columns, values))
    }
}

/// Reads every cell by its runtime storage class.
fn decode_row(row: &SqliteRow) -> Result<Vec<Value>, DbError> {
    (0..row.len())
        .map(|i| {
            let raw = row.try_get_raw(i)?;
            if raw.is_null() {
                return Ok(Value::Null);
            }
            let value = match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" => Value::Integer(row.try_get_unchecked::<i64, _>(i)?),
                "REAL" => Value::Real(row.try_get_unchecked::<f64, _>(i)?),
                "BLOB" => Value::Blob(row.try_get_unchecked::<Vec<u8>, _>(i)?),
                _ => Value::Text(row.try_get_unchecked::<String, _>(i)?),
            };
            Ok(value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_decodes_each_storage_class() {
        let executor = LocalExecutor::in_memory().await.unwrap();
        let rows = executor
            .execute(&Statement::new(
                "SELECT 1 AS i, 2.5 AS r, 'x' AS t, X'0102' AS b, NULL AS n",
            ))
            .await
            .unwrap();

        assert_eq!(rows.columns, vec!["i", "r", "t", "b", "n"]);
        assert_eq!(
            rows.rows[0],
            vec![
                Value::Integer(1),
                Value::Real(2.5),
                Value::Text("x".into()),
                Value::Blob(vec![1, 2]),
                Value::Null,
            ]
        );
    }

    #[tokio::test]
    async fn test_binds_positional_arguments() {
        let executor = LocalExecutor::in_memory().await.unwrap();
        let rows = executor
            .execute(&Statement::with_args(
                "SELECT ? AS a, ? AS b, ? AS c",
                vec![Value::Integer(7), "seven".into(), Value::Null],
            ))
            .await
            .unwrap();

        assert_eq!(
            rows.rows[0],
            vec![Value::Integer(7), Value::Text("seven".into()), Value::Null]
        );
    }

    #[tokio::test]
    async fn test_malformed_sql_is_an_error() {
        let executor = LocalExecutor::in_memory().await.unwrap();
        let result = executor.execute(&Statement::new("SELEC nonsense")).await;
        assert!(matches!(result, Err(DbError::ConnectionError(_))));
    }
}
