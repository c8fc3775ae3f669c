use connectors::sql::base::error::DbError;
use planner::error::CompileError;
use std::{path::PathBuf, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("No model with code: {0}")]
    ModelCodeNotFound(String),

    /// The model's metadata or SQL could not be turned into a safe statement.
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("Unsupported dialect '{dialect}' for connection {conn_id}")]
    UnsupportedDialect { conn_id: String, dialect: String },

    /// Opening or probing a handle failed after every attempt.
    #[error("Connection {conn_id} failed: {message}")]
    ConnectionFailure { conn_id: String, message: String },

    /// The driver rejected or failed the statement; its message is kept as is.
    #[error("Execution failed: {0}")]
    ExecutionFailure(#[from] DbError),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Metadata repository error: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// Errors raised by an external metadata store.
    #[error("Repository backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}
