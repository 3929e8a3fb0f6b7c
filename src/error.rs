use thiserror::Error;

/// Error type for pgrepo operations
#[derive(Debug, Error)]
pub enum PgRepoError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Missing named parameter: {0}")]
    MissingParameter(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Column {column}: expected {expected}, got {found}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: String,
    },
}

/// Result type alias for pgrepo operations
pub type Result<T> = std::result::Result<T, PgRepoError>;
