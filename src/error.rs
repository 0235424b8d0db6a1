use thiserror::Error;

#[cfg(feature = "sqlite")]
use rusqlite;
#[cfg(feature = "postgres")]
use tokio_postgres;

#[derive(Debug, Error)]
pub enum SqlBindError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PoolErrorPostgres(#[from] deadpool_postgres::PoolError),

    /// A column returned by the query has no destination field.
    #[error("No target for column {column}")]
    SchemaMismatch { column: String },

    /// A stored value could not be converted into the field's declared type.
    #[error("Cannot scan column {column}: {message}")]
    ScanError { column: String, message: String },

    #[error("Expected {expected} destination locations, cursor has {actual} columns")]
    ColumnCountMismatch { expected: usize, actual: usize },

    #[error("Column tag {0} is registered more than once")]
    DuplicateTag(String),

    #[error("Nested field {0} declares nested fields of its own")]
    UnsupportedNesting(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Other database error: {0}")]
    Other(String),
}

impl SqlBindError {
    /// Schema drift between a query and its destination record.
    ///
    /// Callers running with [`MismatchPolicy::Error`](crate::binder::MismatchPolicy::Error)
    /// should treat this as a programming error rather than retrying.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SchemaMismatch { .. })
    }

    pub(crate) fn scan(column: &str, message: impl Into<String>) -> Self {
        Self::ScanError {
            column: column.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<bb8::RunError<SqlBindError>> for SqlBindError {
    fn from(err: bb8::RunError<SqlBindError>) -> Self {
        SqlBindError::ConnectionError(format!("SQLite pool error: {err}"))
    }
}
