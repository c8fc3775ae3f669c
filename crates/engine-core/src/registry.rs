//! Process-scoped cache of live database handles keyed by connection ID.
//!
//! Each ID owns a slot behind its own async mutex, so resolving one ID never
//! waits on another and concurrent resolves of the same ID share one handle.
//! Cached handles are probed on every resolve and rebuilt when the probe fails.
//!
//! A slot leaves the map only while its lock is held, and a resolver checks
//! that the slot it locked is still mapped before using it. Slots left empty
//! by a failed open are removed, so unknown IDs do not accumulate.

use crate::{
    config::EngineConfig,
    error::EngineError,
    metrics::Metrics,
    repository::ConnectionSource,
    retry::{RetryDisposition, RetryPolicy},
};
use async_trait::async_trait;
use connectors::{adapter::Adapter, error::AdapterError, sql::base::adapter::SqlAdapter};
use model::execution::connection::ConnectionConfig;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{
    sync::{Mutex, OwnedMutexGuard, RwLock},
    time::timeout,
};
use tracing::{debug, info, warn};

/// Builds a live handle from stored connection metadata.
#[async_trait]
pub trait AdapterFactory: Send + Sync {
    async fn open(&self, config: &ConnectionConfig) -> Result<Arc<dyn SqlAdapter>, AdapterError>;
}

/// Opens real MySQL, PostgreSQL or SQLite handles.
pub struct DriverFactory;

#[async_trait]
impl AdapterFactory for DriverFactory {
    async fn open(&self, config: &ConnectionConfig) -> Result<Arc<dyn SqlAdapter>, AdapterError> {
        Ok(Adapter::from_config(config).await?.into_shared())
    }
}

type Slot = Arc<Mutex<Option<Arc<dyn SqlAdapter>>>>;
type SlotGuard = OwnedMutexGuard<Option<Arc<dyn SqlAdapter>>>;

pub struct ConnectionRegistry {
    source: Arc<dyn ConnectionSource>,
    factory: Arc<dyn AdapterFactory>,
    slots: RwLock<HashMap<String, Slot>>,
    probe_timeout: Duration,
    connect_timeout: Duration,
    retry: RetryPolicy,
    metrics: Metrics,
}

impl ConnectionRegistry {
    pub fn new(
        source: Arc<dyn ConnectionSource>,
        factory: Arc<dyn AdapterFactory>,
        config: &EngineConfig,
        metrics: Metrics,
    ) -> Self {
        ConnectionRegistry {
            source,
            factory,
            slots: RwLock::new(HashMap::new()),
            probe_timeout: config.probe_timeout,
            connect_timeout: config.connect_timeout,
            retry: RetryPolicy::for_connections(config.connect_attempts),
            metrics,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// A healthy handle for `conn_id`, opening or rebuilding one as needed.
    pub async fn resolve(&self, conn_id: &str) -> Result<Arc<dyn SqlAdapter>, EngineError> {
        let (slot, mut cached) = self.lock_slot(conn_id).await;

        if let Some(handle) = cached.as_ref() {
            match self.probe(conn_id, handle.as_ref()).await {
                Ok(()) => return Ok(Arc::clone(handle)),
                Err(error) => {
                    self.metrics.increment_probe_failures(1);
                    warn!(%conn_id, %error, "Cached connection failed its liveness probe, rebuilding");
                }
            }
            if let Some(stale) = cached.take() {
                close_quietly(conn_id, stale.as_ref()).await;
            }
        }

        match self.open(conn_id).await {
            Ok(handle) => {
                *cached = Some(Arc::clone(&handle));
                Ok(handle)
            }
            Err(err) => {
                self.discard(conn_id, &slot).await;
                Err(err)
            }
        }
    }

    /// Installs a prebuilt handle, replacing any cached one.
    pub async fn set_custom_connection(&self, conn_id: &str, handle: Arc<dyn SqlAdapter>) {
        let (_, mut cached) = self.lock_slot(conn_id).await;
        if let Some(previous) = cached.replace(handle) {
            close_quietly(conn_id, previous.as_ref()).await;
        }
    }

    /// Drops and closes the cached handle for `conn_id`, if any.
    pub async fn invalidate(&self, conn_id: &str) {
        let Some(slot) = self.slots.read().await.get(conn_id).cloned() else {
            return;
        };
        if let Some(handle) = self.evict(conn_id, slot).await {
            close_quietly(conn_id, handle.as_ref()).await;
        }
        debug!(%conn_id, "Connection invalidated");
    }

    /// Closes every cached handle and empties the cache. An open already in
    /// flight finishes first and its handle is closed with the rest.
    pub async fn shutdown(&self) {
        for (conn_id, slot) in self.snapshot().await {
            if let Some(handle) = self.evict(&conn_id, slot).await {
                close_quietly(&conn_id, handle.as_ref()).await;
            }
        }
        info!("Connection registry shut down");
    }

    pub async fn cached_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        for (id, slot) in self.snapshot().await {
            if slot.lock().await.is_some() {
                ids.push(id);
            }
        }
        ids.sort();
        ids
    }

    async fn snapshot(&self) -> Vec<(String, Slot)> {
        self.slots
            .read()
            .await
            .iter()
            .map(|(id, slot)| (id.clone(), Arc::clone(slot)))
            .collect()
    }

    async fn slot(&self, conn_id: &str) -> Slot {
        if let Some(slot) = self.slots.read().await.get(conn_id) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write().await;
        Arc::clone(slots.entry(conn_id.to_string()).or_default())
    }

    /// Locks the slot currently mapped to `conn_id`, creating it if needed.
    async fn lock_slot(&self, conn_id: &str) -> (Slot, SlotGuard) {
        loop {
            let slot = self.slot(conn_id).await;
            let guard = Arc::clone(&slot).lock_owned().await;
            if self.is_current(conn_id, &slot).await {
                return (slot, guard);
            }
        }
    }

    async fn is_current(&self, conn_id: &str, slot: &Slot) -> bool {
        self.slots
            .read()
            .await
            .get(conn_id)
            .is_some_and(|mapped| Arc::ptr_eq(mapped, slot))
    }

    /// Unmaps `slot`. Callers hold its lock.
    async fn discard(&self, conn_id: &str, slot: &Slot) {
        let mut slots = self.slots.write().await;
        if slots
            .get(conn_id)
            .is_some_and(|mapped| Arc::ptr_eq(mapped, slot))
        {
            slots.remove(conn_id);
        }
    }

    /// Waits for any open on `slot` to finish, then unmaps it and returns
    /// the handle it held.
    async fn evict(&self, conn_id: &str, slot: Slot) -> Option<Arc<dyn SqlAdapter>> {
        let mut cached = Arc::clone(&slot).lock_owned().await;
        self.discard(conn_id, &slot).await;
        cached.take()
    }

    async fn probe(&self, conn_id: &str, handle: &dyn SqlAdapter) -> Result<(), EngineError> {
        match timeout(self.probe_timeout, handle.ping()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(EngineError::ConnectionFailure {
                conn_id: conn_id.to_string(),
                message: err.to_string(),
            }),
            Err(_) => Err(EngineError::Timeout {
                operation: "liveness probe",
                after: self.probe_timeout,
            }),
        }
    }

    async fn open(&self, conn_id: &str) -> Result<Arc<dyn SqlAdapter>, EngineError> {
        let config = self
            .source
            .load_connection(conn_id)
            .await?
            .ok_or_else(|| EngineError::ConnectionNotFound(conn_id.to_string()))?;

        let dialect = config.dialect();
        if !dialect.is_supported() {
            return Err(EngineError::UnsupportedDialect {
                conn_id: conn_id.to_string(),
                dialect: dialect.to_string(),
            });
        }

        let handle = self
            .retry
            .run(
                || self.build(&config),
                |err| match err {
                    EngineError::ConnectionFailure { .. } | EngineError::Timeout { .. } => {
                        RetryDisposition::Retry
                    }
                    _ => RetryDisposition::Stop,
                },
            )
            .await
            .map_err(|err| err.into_inner())?;

        self.metrics.increment_connections(1);
        info!(%conn_id, %dialect, "Opened connection");
        Ok(handle)
    }

    async fn build(&self, config: &ConnectionConfig) -> Result<Arc<dyn SqlAdapter>, EngineError> {
        let opened = timeout(self.connect_timeout, self.factory.open(config))
            .await
            .map_err(|_| EngineError::Timeout {
                operation: "connection open",
                after: self.connect_timeout,
            })?;
        let handle = opened.map_err(|err| match err {
            AdapterError::UnsupportedDialect(dialect) => EngineError::UnsupportedDialect {
                conn_id: config.id.clone(),
                dialect,
            },
            other => EngineError::ConnectionFailure {
                conn_id: config.id.clone(),
                message: other.to_string(),
            },
        })?;

        if let Err(error) = self.probe(&config.id, handle.as_ref()).await {
            warn!(conn_id = %config.id, %error, "New connection failed its first probe");
            close_quietly(&config.id, handle.as_ref()).await;
            return Err(error);
        }
        Ok(handle)
    }
}

async fn close_quietly(conn_id: &str, handle: &dyn SqlAdapter) {
    if let Err(error) = handle.close().await {
        warn!(%conn_id, %error, "Failed to close connection");
    }
}
