use crate::{config::EngineConfig, error::EngineError, metrics::Metrics, registry::ConnectionRegistry};
use connectors::sql::base::error::DbError;
use model::{core::value::Value, records::row::Record};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::time::timeout;
use tracing::{debug, error, warn};

/// Runs compiled statements on handles from the registry.
pub struct QueryExecutor {
    registry: Arc<ConnectionRegistry>,
    query_timeout: Duration,
    slow_query_threshold: Duration,
    metrics: Metrics,
}

impl QueryExecutor {
    pub fn new(registry: Arc<ConnectionRegistry>, config: &EngineConfig, metrics: Metrics) -> Self {
        QueryExecutor {
            registry,
            query_timeout: config.query_timeout,
            slow_query_threshold: config.slow_query_threshold,
            metrics,
        }
    }

    pub async fn execute(
        &self,
        conn_id: &str,
        sql: &str,
        args: &[Value],
    ) -> Result<Vec<Record>, EngineError> {
        let handle = self.registry.resolve(conn_id).await?;

        let started = Instant::now();
        let outcome = timeout(self.query_timeout, handle.query(sql, args)).await;
        let duration = started.elapsed();

        let rows = match outcome {
            Ok(Ok(rows)) => rows,
            Ok(Err(err)) => {
                self.metrics.increment_failures(1);
                error!(%conn_id, error = %err, "Query failed: {sql}");
                return Err(EngineError::ExecutionFailure(err));
            }
            Err(_) => {
                self.metrics.increment_failures(1);
                error!(%conn_id, timeout = ?self.query_timeout, "Query timed out: {sql}");
                return Err(EngineError::Timeout {
                    operation: "query",
                    after: self.query_timeout,
                });
            }
        };

        self.metrics.increment_queries(1);
        debug!(%conn_id, ?duration, args = args.len(), rows = rows.len(), "Executed: {sql}");
        if duration > self.slow_query_threshold {
            self.metrics.increment_slow_queries(1);
            warn!(
                %conn_id,
                ?duration,
                threshold = ?self.slow_query_threshold,
                "Slow query: {sql}"
            );
        }
        Ok(rows)
    }

    /// Counts the rows `sql` would return.
    pub async fn execute_count(
        &self,
        conn_id: &str,
        sql: &str,
        args: &[Value],
    ) -> Result<i64, EngineError> {
        let rows = self.execute(conn_id, &count_sql(sql), args).await?;
        rows.first()
            .and_then(Record::first)
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                EngineError::ExecutionFailure(DbError::Unknown(
                    "count query returned no integer".into(),
                ))
            })
    }
}

pub fn count_sql(sql: &str) -> String {
    let inner = sql.trim().trim_end_matches(';').trim_end();
    format!("SELECT COUNT(*) FROM ({inner}) AS total")
}
