use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database connection settings: {0}")]
    ConnectionConfigError(String),

    #[error("SQLite error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("HTTP request to the database failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("The database responded with HTTP {status}: {body}")]
    StatusError { status: u16, body: String },

    #[error("Query failed: {message}")]
    QueryError { message: String, code: Option<String> },

    #[error("Failed to decode the database response: {0}")]
    DecodeError(String),

    #[error("An error occurred during JSON serialization/deserialization: {0}")]
    JsonError(#[from] serde_json::Error),
}
