use crate::sql::base::error::{ConnectorError, DbError};
use async_trait::async_trait;
use model::{
    core::value::Value, execution::connection::DialectKind, records::row::Record,
};

/// A live handle to one database. Implementations pool or serialize
/// connections internally and are shared across tasks.
#[async_trait]
pub trait SqlAdapter: Send + Sync {
    async fn connect(url: &str) -> Result<Self, ConnectorError>
    where
        Self: Sized;

    /// Cheap round trip proving the handle still works.
    async fn ping(&self) -> Result<(), DbError>;

    /// Runs one statement with `?` placeholders and returns its rows.
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>, DbError>;

    /// Releases pooled connections. The handle must not be used afterwards.
    async fn close(&self) -> Result<(), DbError>;

    fn kind(&self) -> DialectKind;
}
