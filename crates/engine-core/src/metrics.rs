use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    queries_executed: AtomicU64,
    query_failures: AtomicU64,
    slow_queries: AtomicU64,
    connections_opened: AtomicU64,
    probe_failures: AtomicU64,
}

/// Process-wide counters shared by the registry and the executor.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queries_executed: u64,
    pub query_failures: u64,
    pub slow_queries: u64,
    pub connections_opened: u64,
    pub probe_failures: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_queries(&self, count: u64) {
        self.inner
            .queries_executed
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_failures(&self, count: u64) {
        self.inner.query_failures.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_slow_queries(&self, count: u64) {
        self.inner.slow_queries.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_connections(&self, count: u64) {
        self.inner
            .connections_opened
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_probe_failures(&self, count: u64) {
        self.inner.probe_failures.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_executed: self.inner.queries_executed.load(Ordering::Relaxed),
            query_failures: self.inner.query_failures.load(Ordering::Relaxed),
            slow_queries: self.inner.slow_queries.load(Ordering::Relaxed),
            connections_opened: self.inner.connections_opened.load(Ordering::Relaxed),
            probe_failures: self.inner.probe_failures.load(Ordering::Relaxed),
        }
    }
}
