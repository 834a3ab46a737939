use crate::error::DbError;
use crate::executor::Executor;
use crate::local::LocalExecutor;
use crate::remote::RemoteExecutor;
use configuration::DatabaseSettings;
use std::sync::Arc;

/// Opens the telemetry database described by `settings`.
///
/// This is the single initialization step for the process-wide database
/// handle. Missing or unusable settings are reported here instead of on the
/// first query.
///
/// - `libsql://`, `https://`, `http://`: remote libSQL, auth token required.
/// - `sqlite:`, `file:`: local SQLite file, opened read-only.
pub async fn connect(settings: &DatabaseSettings) -> Result<Arc<dyn Executor>, DbError> {
    let url = match settings.url.as_deref().filter(|u| !u.is_empty()) {
        Some(url) => url,
        None => {
            settings.report_missing();
            return Err(DbError::ConnectionConfigError(
                "TURSO_DATABASE_URL must be set.".to_string(),
            ));
        }
    };

    if is_local(url) {
        let url = match url.strip_prefix("file:") {
            Some(path) => format!("sqlite:{}", path),
            None => url.to_string(),
        };
        let executor = LocalExecutor::connect(&url).await?;
        return Ok(Arc::new(executor));
    }

    if !is_remote(url) {
        return Err(DbError::ConnectionConfigError(format!(
            "Unsupported database URL scheme: {}",
            url
        )));
    }

    let token = match settings.auth_token.as_deref().filter(|t| !t.is_empty()) {
        Some(token) => token,
        None => {
            settings.report_missing();
            return Err(DbError::ConnectionConfigError(
                "TURSO_AUTH_TOKEN must be set for a remote database.".to_string(),
            ));
        }
    };

    let executor = RemoteExecutor::new(url, token)?;
    tracing::info!(endpoint = %executor.pipeline_url(), "Using remote libSQL database.");
    Ok(Arc::new(executor))
}

fn is_local(url: &str) -> bool {
    url.starts_with("sqlite:") || url.starts_with("file:")
}

fn is_remote(url: &str) -> bool {
    ["libsql://", "https://", "http://"]
        .iter()
        .any(|scheme| url.starts_with(scheme))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(url: Option<&str>, token: Option<&str>) -> DatabaseSettings {
        DatabaseSettings {
            url: url.map(str::to_string),
            auth_token: token.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_missing_url_is_config_error() {
        let result = connect(&settings(None, Some("t"))).await;
        assert!(matches!(result, Err(DbError::ConnectionConfigError(_))));
    }

    #[tokio::test]
    async fn test_remote_requires_token() {
        let result = connect(&settings(Some("libsql://db.turso.io"), None)).await;
        assert!(matches!(result, Err(DbError::ConnectionConfigError(_))));

        let result = connect(&settings(Some("libsql://db.turso.io"), Some(""))).await;
        assert!(matches!(result, Err(DbError::ConnectionConfigError(_))));
    }

    #[tokio::test]
    async fn test_remote_with_token_builds_client() {
        assert!(connect(&settings(Some("libsql://db.turso.io"), Some("token"))).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_scheme_is_rejected() {
        let result = connect(&settings(Some("postgres://localhost/db"), Some("t"))).await;
        assert!(matches!(result, Err(DbError::ConnectionConfigError(_))));
    }

    #[tokio::test]
    async fn test_local_file_opens_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.db");

        // Create the file first; a read-only open will not create it.
        let options = sqlx::sqlite::SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);
        let pool = sqlx::SqlitePool::connect_with(options).await.unwrap();
        sqlx::query("CREATE TABLE positions (id INTEGER PRIMARY KEY, timestamp TEXT)")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;

        let url = format!("file:{}", path.display());
        let executor = connect(&settings(Some(&url), None)).await.unwrap();

        let rows = executor
            .execute(&crate::query::Statement::new("SELECT COUNT(*) AS n FROM positions"))
            .await
            .unwrap();
        assert_eq!(rows.rows[0][0], core_types::Value::Integer(0));

        let write = executor
            .execute(&crate::query::Statement::new(
                "INSERT INTO positions (timestamp) VALUES ('2026-01-01')",
            ))
            .await;
        assert!(write.is_err());
    }
}
