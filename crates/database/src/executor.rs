use crate::error::DbError;
use crate::query::Statement;
use async_trait::async_trait;
use core_types::Rows;

/// The transport seam between the repository and a concrete database.
///
/// Implementations run one parameterized statement and hand back the raw
/// column names and positional rows; shaping into records happens above.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, statement: &Statement) -> Result<Rows, DbError>;
}
