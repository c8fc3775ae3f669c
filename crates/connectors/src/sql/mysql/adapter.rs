use crate::sql::{
    base::{
        adapter::SqlAdapter,
        error::{ConnectorError, DbError},
    },
    mysql::{params::MySqlParamStore, row},
};
use async_trait::async_trait;
use model::{core::value::Value, execution::connection::DialectKind, records::row::Record};
use mysql_async::{Opts, Pool, Row, prelude::Queryable};
use tracing::{debug, info};

#[derive(Clone)]
pub struct MySqlAdapter {
    pool: Pool,
}

#[async_trait]
impl SqlAdapter for MySqlAdapter {
    async fn connect(url: &str) -> Result<Self, ConnectorError> {
        let opts = Opts::from_url(url).map_err(|e| ConnectorError::InvalidUrl(e.to_string()))?;
        let adapter = MySqlAdapter {
            pool: Pool::new(opts),
        };
        adapter.ping().await?;
        info!("Connected to MySQL");
        Ok(adapter)
    }

    async fn ping(&self) -> Result<(), DbError> {
        let mut conn = self.pool.get_conn().await?;
        conn.ping().await?;
        Ok(())
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>, DbError> {
        debug!(params = params.len(), "Executing MySQL query: {sql}");
        let bindings = MySqlParamStore::from_values(params);
        let mut conn = self.pool.get_conn().await?;
        let rows: Vec<Row> = conn.exec(sql, bindings.params()).await?;
        Ok(rows.iter().map(row::to_record).collect())
    }

    async fn close(&self) -> Result<(), DbError> {
        self.pool.clone().disconnect().await?;
        Ok(())
    }

    fn kind(&self) -> DialectKind {
        DialectKind::MySql
    }
}
