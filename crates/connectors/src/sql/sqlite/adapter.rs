use crate::sql::{
    base::{
        adapter::SqlAdapter,
        error::{ConnectorError, DbError},
    },
    sqlite::value::Value,
};
use async_trait::async_trait;
use model::{
    core::value::Value as CoreValue, execution::connection::DialectKind, records::row::Record,
};
use percent_encoding::percent_decode_str;
use rusqlite::{Connection, params_from_iter};
use std::{
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::{debug, info};
use url::Url;

/// Where a SQLite DSN points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqliteTarget {
    File(PathBuf),
    InMemory,
}

impl SqliteTarget {
    /// Accepts `sqlite:///abs/path`, `sqlite:rel/path`, `sqlite::memory:`,
    /// `?mode=memory`, or a bare filesystem path. URL paths are
    /// percent-decoded.
    pub fn parse(dsn: &str) -> Result<Self, ConnectorError> {
        let trimmed = dsn.trim();
        if !trimmed.starts_with("sqlite:") {
            return Self::from_path(trimmed, dsn);
        }

        let url =
            Url::parse(trimmed).map_err(|e| ConnectorError::InvalidUrl(format!("{dsn}: {e}")))?;
        if url.query_pairs().any(|(k, v)| k == "mode" && v == "memory") {
            return Ok(SqliteTarget::InMemory);
        }

        // `sqlite://data/app.db` parses `data` as the host.
        let raw = match url.host_str() {
            Some(host) if !host.is_empty() => format!("{host}{}", url.path()),
            _ => url.path().to_string(),
        };
        let path = percent_decode_str(&raw)
            .decode_utf8()
            .map_err(|e| ConnectorError::InvalidUrl(format!("{dsn}: {e}")))?;
        Self::from_path(&path, dsn)
    }

    fn from_path(path: &str, dsn: &str) -> Result<Self, ConnectorError> {
        match path {
            "" => Err(ConnectorError::InvalidUrl(format!(
                "SQLite DSN has no path: {dsn}"
            ))),
            ":memory:" => Ok(SqliteTarget::InMemory),
            path => Ok(SqliteTarget::File(PathBuf::from(path))),
        }
    }

    fn open(&self) -> rusqlite::Result<Connection> {
        match self {
            SqliteTarget::File(path) => Connection::open(path),
            SqliteTarget::InMemory => Connection::open_in_memory(),
        }
    }
}

/// A single SQLite connection shared behind a mutex; every call runs on the
/// blocking thread pool.
#[derive(Clone)]
pub struct SqliteAdapter {
    conn: Arc<Mutex<Connection>>,
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, DbError> {
    conn.lock()
        .map_err(|_| DbError::Task("SQLite connection lock poisoned".into()))
}

impl SqliteAdapter {
    pub fn from_connection(conn: Connection) -> Self {
        SqliteAdapter {
            conn: Arc::new(Mutex::new(conn)),
        }
    }
}

#[async_trait]
impl SqlAdapter for SqliteAdapter {
    async fn connect(url: &str) -> Result<Self, ConnectorError> {
        let target = SqliteTarget::parse(url)?;
        let opened = tokio::task::spawn_blocking(move || target.open())
            .await
            .map_err(DbError::from)?;
        info!("Opened SQLite database");
        Ok(SqliteAdapter::from_connection(opened?))
    }

    async fn ping(&self) -> Result<(), DbError> {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || -> Result<(), DbError> {
            lock(&conn)?.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await?
    }

    async fn query(&self, sql: &str, params: &[CoreValue]) -> Result<Vec<Record>, DbError> {
        debug!(params = params.len(), "Executing SQLite query: {sql}");
        let conn = Arc::clone(&self.conn);
        let sql = sql.to_string();
        let params = params.to_vec();

        tokio::task::spawn_blocking(move || -> Result<Vec<Record>, DbError> {
            let conn = lock(&conn)?;
            let mut stmt = conn.prepare(&sql)?;
            let names: Vec<String> = stmt
                .column_names()
                .into_iter()
                .map(String::from)
                .collect();

            let bound: Vec<Value> = params.iter().map(Value).collect();
            let mut rows = stmt.query(params_from_iter(bound.iter()))?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                let mut record = Record::default();
                for (idx, name) in names.iter().enumerate() {
                    record.push(name.clone(), Value::from_sql(row, idx)?);
                }
                records.push(record);
            }
            Ok(records)
        })
        .await?
    }

    async fn close(&self) -> Result<(), DbError> {
        // The file handle closes when the last clone is dropped.
        debug!("Releasing SQLite connection");
        Ok(())
    }

    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }
}
