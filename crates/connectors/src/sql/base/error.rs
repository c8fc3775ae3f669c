use thiserror::Error;

/// All errors coming from the database/query layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// MySQL driver error.
    #[error("MySQL error: {0}")]
    MySql(#[from] mysql_async::Error),

    /// PostgreSQL driver error.
    #[error("Postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// SQLite driver error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// An argument could not be converted to the type the server expects.
    #[error("cannot bind argument {index} as {expected}: {value}")]
    Coercion {
        index: usize,
        expected: String,
        value: String,
    },

    /// A blocking driver task panicked or was cancelled.
    #[error("driver task failed: {0}")]
    Task(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<tokio::task::JoinError> for DbError {
    fn from(err: tokio::task::JoinError) -> Self {
        DbError::Task(err.to_string())
    }
}

/// Errors happening during adapter or connection setup.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The connection URL or DSN could not be parsed.
    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),

    #[error("MySQL connection failed: {0}")]
    MySql(#[from] mysql_async::Error),

    #[error("Postgres connection failed: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("SQLite open failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Opening succeeded but the first round trip did not.
    #[error("Connection check failed: {0}")]
    Probe(#[from] DbError),
}
