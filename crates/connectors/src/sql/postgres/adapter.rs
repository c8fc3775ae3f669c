use crate::sql::{
    base::{
        adapter::SqlAdapter,
        error::{ConnectorError, DbError},
    },
    postgres::{params::PgParamStore, row, utils::connect_client},
};
use async_trait::async_trait;
use model::{core::value::Value, execution::connection::DialectKind, records::row::Record};
use planner::query::{dialect, placeholders::number_placeholders};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_postgres::Client;
use tracing::{debug, info};

#[derive(Clone)]
pub struct PgAdapter {
    client: Arc<RwLock<Client>>,
    dialect: dialect::Postgres,
}

#[async_trait]
impl SqlAdapter for PgAdapter {
    async fn connect(url: &str) -> Result<Self, ConnectorError> {
        let client = Arc::new(RwLock::new(connect_client(url).await?));
        info!("Connected to Postgres");
        Ok(PgAdapter {
            client,
            dialect: dialect::Postgres,
        })
    }

    async fn ping(&self) -> Result<(), DbError> {
        let client = self.client.read().await;
        client.simple_query("SELECT 1").await?;
        Ok(())
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>, DbError> {
        let sql = number_placeholders(sql, &self.dialect);
        debug!(params = params.len(), "Executing Postgres query: {sql}");

        let client = self.client.read().await;
        let statement = client.prepare(&sql).await?;
        let bindings = PgParamStore::coerce(params, statement.params())?;
        let rows = client.query(&statement, &bindings.as_refs()).await?;
        Ok(rows.iter().map(row::to_record).collect())
    }

    async fn close(&self) -> Result<(), DbError> {
        // The connection task ends once the last clone of the client is dropped.
        debug!("Releasing Postgres client");
        Ok(())
    }

    fn kind(&self) -> DialectKind {
        DialectKind::Postgres
    }
}
