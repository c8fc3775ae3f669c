//! In-process fakes for registry and executor tests.

use crate::registry::AdapterFactory;
use async_trait::async_trait;
use connectors::{
    error::AdapterError,
    sql::base::{
        adapter::SqlAdapter,
        error::{ConnectorError, DbError},
    },
};
use model::{
    core::value::Value,
    execution::connection::{ConnectionConfig, DialectKind},
    records::row::Record,
};
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

pub(crate) struct FakeAdapter {
    pub healthy: AtomicBool,
    pub closed: AtomicBool,
    pub ping_delay: Duration,
    pub query_delay: Duration,
    pub rows: Vec<Record>,
    pub seen: Mutex<Vec<(String, Vec<Value>)>>,
}

impl FakeAdapter {
    pub fn new(rows: Vec<Record>) -> Self {
        FakeAdapter {
            healthy: AtomicBool::new(true),
            closed: AtomicBool::new(false),
            ping_delay: Duration::ZERO,
            query_delay: Duration::ZERO,
            rows,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn statements(&self) -> Vec<(String, Vec<Value>)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl SqlAdapter for FakeAdapter {
    async fn connect(url: &str) -> Result<Self, ConnectorError> {
        Err(ConnectorError::InvalidUrl(url.to_string()))
    }

    async fn ping(&self) -> Result<(), DbError> {
        tokio::time::sleep(self.ping_delay).await;
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DbError::Unknown("connection reset".into()))
        }
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>, DbError> {
        tokio::time::sleep(self.query_delay).await;
        self.seen
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        if sql.contains("broken") {
            return Err(DbError::Unknown("syntax error near broken".into()));
        }
        Ok(self.rows.clone())
    }

    async fn close(&self) -> Result<(), DbError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn kind(&self) -> DialectKind {
        DialectKind::MySql
    }
}

/// Counts opens; the first `failures` opens fail.
pub(crate) struct FakeFactory {
    pub opens: AtomicUsize,
    pub failures: usize,
    pub open_delay: Duration,
    pub opened: Mutex<Vec<Arc<FakeAdapter>>>,
}

impl FakeFactory {
    pub fn new() -> Self {
        FakeFactory {
            opens: AtomicUsize::new(0),
            failures: 0,
            open_delay: Duration::ZERO,
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn last_opened(&self) -> Arc<FakeAdapter> {
        self.opened.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl AdapterFactory for FakeFactory {
    async fn open(&self, config: &ConnectionConfig) -> Result<Arc<dyn SqlAdapter>, AdapterError> {
        let attempt = self.opens.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.open_delay).await;
        if attempt < self.failures {
            return Err(AdapterError::InvalidConfig(format!(
                "{} refused attempt {attempt}",
                config.id
            )));
        }
        let adapter = Arc::new(FakeAdapter::new(Vec::new()));
        self.opened.lock().unwrap().push(Arc::clone(&adapter));
        Ok(adapter)
    }
}

pub(crate) fn connection(id: &str, kind: &str) -> ConnectionConfig {
    ConnectionConfig {
        id: id.into(),
        kind: kind.into(),
        host: "localhost".into(),
        ..Default::default()
    }
}
