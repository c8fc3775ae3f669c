use crate::sql::base::error::{ConnectorError, DbError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// The connection names a dialect no adapter exists for.
    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    /// Failed to initialize a data connector/adapter.
    #[error("Connector error: {0}")]
    Connector(#[from] ConnectorError),

    /// Database-related error.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Connection metadata is incomplete.
    #[error("Invalid connection config: {0}")]
    InvalidConfig(String),
}
