use async_trait::async_trait;

use crate::error::Result;
use crate::types::{NamedParams, RawQueryResult, SqlValue};

/// Trait for database driver implementations.
/// Drivers are responsible for:
/// - Reporting whether the connection is alive
/// - Converting SqlValue parameters to native types
/// - Executing statements and converting results to RawQueryResult
///
/// Errors are returned as reported by the database; callers never retry.
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Liveness probe. Fails when the connection cannot serve statements.
    async fn ping(&self) -> Result<()>;

    /// Execute a query returning rows.
    /// Parameters use PostgreSQL-style placeholders ($1, $2, etc.)
    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<RawQueryResult>;

    /// Execute a statement without result rows, returning the affected row count.
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64>;

    /// Execute a `:name` template once per row as a single statement.
    async fn execute_named(&self, template: &str, rows: &[NamedParams]) -> Result<u64>;
}
