use crate::{
    assembler::ModelAssembler,
    config::EngineConfig,
    error::EngineError,
    executor::QueryExecutor,
    metrics::{Metrics, MetricsSnapshot},
    registry::{AdapterFactory, ConnectionRegistry, DriverFactory},
    repository::{ConnectionSource, MetadataRepository, catalog::Catalog},
};
use model::{
    core::{params::Params, value::Value},
    metadata::{model::Model, rows::ListFilter},
    records::row::Record,
};
use planner::{
    compiler::StatementCompiler,
    query::dialect::{self, Dialect, MySql},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// A compiled statement and the connection it runs on.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub args: Vec<Value>,
    pub conn_id: String,
}

/// One page of rows plus the unpaged total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub rows: Vec<Record>,
    pub total: i64,
}

/// Compiles models from metadata and runs them on their connections.
pub struct QueryEngine {
    assembler: ModelAssembler,
    connections: Arc<dyn ConnectionSource>,
    registry: Arc<ConnectionRegistry>,
    executor: QueryExecutor,
    metrics: Metrics,
}

impl QueryEngine {
    pub fn new(
        repository: Arc<dyn MetadataRepository>,
        connections: Arc<dyn ConnectionSource>,
        factory: Arc<dyn AdapterFactory>,
        config: &EngineConfig,
    ) -> Self {
        let metrics = Metrics::new();
        let registry = Arc::new(ConnectionRegistry::new(
            Arc::clone(&connections),
            factory,
            config,
            metrics.clone(),
        ));
        QueryEngine {
            assembler: ModelAssembler::new(repository),
            connections,
            executor: QueryExecutor::new(Arc::clone(&registry), config, metrics.clone()),
            registry,
            metrics,
        }
    }

    /// Engine over a catalog, opening real database drivers.
    pub fn from_catalog(catalog: Catalog, config: &EngineConfig) -> Self {
        let catalog = Arc::new(catalog);
        Self::new(
            Arc::clone(&catalog) as Arc<dyn MetadataRepository>,
            catalog,
            Arc::new(DriverFactory),
            config,
        )
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub async fn compile(&self, model_id: &str, params: &Params) -> Result<CompiledQuery, EngineError> {
        self.compile_with(model_id, params, &[], true).await
    }

    pub async fn execute(
        &self,
        conn_id: &str,
        sql: &str,
        args: &[Value],
    ) -> Result<Vec<Record>, EngineError> {
        self.executor.execute(conn_id, sql, args).await
    }

    pub async fn execute_count(
        &self,
        conn_id: &str,
        sql: &str,
        args: &[Value],
    ) -> Result<i64, EngineError> {
        self.executor.execute_count(conn_id, sql, args).await
    }

    pub async fn run(&self, model_id: &str, params: &Params) -> Result<Vec<Record>, EngineError> {
        let query = self.compile(model_id, params).await?;
        self.execute(&query.conn_id, &query.sql, &query.args).await
    }

    /// Counts every row the model matches, ignoring its page window.
    pub async fn count(&self, model_id: &str, params: &Params) -> Result<i64, EngineError> {
        let query = self.compile_with(model_id, params, &[], false).await?;
        self.execute_count(&query.conn_id, &query.sql, &query.args).await
    }

    pub async fn list(&self, model_id: &str, params: &Params) -> Result<Page, EngineError> {
        self.list_filtered(model_id, params, &[]).await
    }

    /// A page with caller filters ANDed onto the model's WHERE rows.
    /// The total counts the filtered rows.
    pub async fn list_filtered(
        &self,
        model_id: &str,
        params: &Params,
        filters: &[ListFilter],
    ) -> Result<Page, EngineError> {
        let paged = self.compile_with(model_id, params, filters, true).await?;
        let unpaged = self.compile_with(model_id, params, filters, false).await?;
        let (rows, total) = futures::try_join!(
            self.execute(&paged.conn_id, &paged.sql, &paged.args),
            self.execute_count(&unpaged.conn_id, &unpaged.sql, &unpaged.args),
        )?;
        Ok(Page { rows, total })
    }

    /// The model whose code matches.
    pub async fn model_id_for_code(&self, code: &str) -> Result<String, EngineError> {
        self.assembler.resolve_code(code).await
    }

    pub async fn list_by_code(
        &self,
        code: &str,
        params: &Params,
        filters: &[ListFilter],
    ) -> Result<Page, EngineError> {
        let model_id = self.model_id_for_code(code).await?;
        self.list_filtered(&model_id, params, filters).await
    }

    /// Closes every cached connection.
    pub async fn shutdown(&self) {
        self.registry.shutdown().await;
        info!(metrics = ?self.metrics.snapshot(), "Query engine stopped");
    }

    async fn compile_with(
        &self,
        model_id: &str,
        params: &Params,
        filters: &[ListFilter],
        paged: bool,
    ) -> Result<CompiledQuery, EngineError> {
        let data = self.assembler.assemble(model_id).await?;
        let dialect = self.dialect_for(&data.model).await?;
        let compiler = StatementCompiler::new(dialect).with_filters(filters);
        let statement = if paged {
            compiler.compile(&data, params)?
        } else {
            compiler.compile_unpaged(&data, params)?
        };
        Ok(CompiledQuery {
            sql: statement.sql,
            args: statement.args,
            conn_id: data.model.conn_id,
        })
    }

    /// Quoting follows the model's connection; MySQL when it has none.
    async fn dialect_for(&self, model: &Model) -> Result<&'static dyn Dialect, EngineError> {
        if model.conn_id.is_empty() {
            return Ok(&MySql);
        }
        let Some(config) = self.connections.load_connection(&model.conn_id).await? else {
            return Ok(&MySql);
        };
        let kind = config.dialect();
        dialect::for_kind(&kind).ok_or_else(|| EngineError::UnsupportedDialect {
            conn_id: model.conn_id.clone(),
            dialect: kind.to_string(),
        })
    }
}
