use crate::{
    error::RepositoryError,
    repository::{ConnectionSource, MetadataRepository},
};
use async_trait::async_trait;
use model::{
    execution::connection::ConnectionConfig,
    metadata::{
        model::{Model, ModelData},
        rows::{Condition, Field, Group, Join, Limit, Order, RawSql, Table},
    },
};
use serde::Deserialize;
use std::{collections::HashMap, path::Path};
use tracing::info;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CatalogFile {
    connections: Vec<ConnectionConfig>,
    models: Vec<ModelEntry>,
}

/// One model and its rows as written in a catalog file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModelEntry {
    #[serde(flatten)]
    model: Model,
    tables: Vec<Table>,
    fields: Vec<Field>,
    joins: Vec<Join>,
    wheres: Vec<Condition>,
    groups: Vec<Group>,
    havings: Vec<Condition>,
    orders: Vec<Order>,
    limit: Option<Limit>,
    sql: Option<String>,
}

impl From<ModelEntry> for ModelData {
    fn from(entry: ModelEntry) -> Self {
        ModelData {
            model: entry.model,
            tables: entry.tables,
            fields: entry.fields,
            joins: entry.joins,
            wheres: entry.wheres,
            groups: entry.groups,
            havings: entry.havings,
            orders: entry.orders,
            limit: entry.limit,
            sql: entry.sql.map(|content| RawSql { content }),
        }
    }
}

/// In-memory metadata store, usually loaded from a JSON catalog file.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    connections: HashMap<String, ConnectionConfig>,
    models: HashMap<String, ModelData>,
}

impl Catalog {
    pub fn from_json(text: &str) -> Result<Self, RepositoryError> {
        let file: CatalogFile = serde_json::from_str(text)?;
        let mut catalog = Catalog::default();
        for conn in file.connections {
            catalog.insert_connection(conn);
        }
        for entry in file.models {
            catalog.insert_model(entry.into());
        }
        Ok(catalog)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| RepositoryError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let catalog = Self::from_json(&text)?;
        info!(
            path = %path.display(),
            models = catalog.models.len(),
            connections = catalog.connections.len(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    pub fn insert_connection(&mut self, conn: ConnectionConfig) {
        self.connections.insert(conn.id.clone(), conn);
    }

    pub fn insert_model(&mut self, data: ModelData) {
        self.models.insert(data.model.id.clone(), data);
    }

    pub fn with_connection(mut self, conn: ConnectionConfig) -> Self {
        self.insert_connection(conn);
        self
    }

    pub fn with_model(mut self, data: ModelData) -> Self {
        self.insert_model(data);
        self
    }

    /// Model IDs in ascending order.
    pub fn model_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.models.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    fn rows<T: Clone>(&self, model_id: &str, pick: impl Fn(&ModelData) -> &Vec<T>) -> Vec<T> {
        self.models
            .get(model_id)
            .map(|data| pick(data).clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MetadataRepository for Catalog {
    async fn load_model(&self, model_id: &str) -> Result<Option<Model>, RepositoryError> {
        Ok(self.models.get(model_id).map(|data| data.model.clone()))
    }

    /// Codes are not unique across tenants; the lowest model ID wins.
    async fn load_model_by_code(&self, code: &str) -> Result<Option<Model>, RepositoryError> {
        if code.is_empty() {
            return Ok(None);
        }
        Ok(self
            .models
            .values()
            .map(|data| &data.model)
            .filter(|model| model.code == code)
            .min_by(|a, b| a.id.cmp(&b.id))
            .cloned())
    }

    async fn load_tables(&self, model_id: &str) -> Result<Vec<Table>, RepositoryError> {
        Ok(self.rows(model_id, |d| &d.tables))
    }

    async fn load_fields(&self, model_id: &str) -> Result<Vec<Field>, RepositoryError> {
        Ok(self.rows(model_id, |d| &d.fields))
    }

    async fn load_joins(&self, model_id: &str) -> Result<Vec<Join>, RepositoryError> {
        Ok(self.rows(model_id, |d| &d.joins))
    }

    async fn load_wheres(&self, model_id: &str) -> Result<Vec<Condition>, RepositoryError> {
        Ok(self.rows(model_id, |d| &d.wheres))
    }

    async fn load_groups(&self, model_id: &str) -> Result<Vec<Group>, RepositoryError> {
        Ok(self.rows(model_id, |d| &d.groups))
    }

    async fn load_havings(&self, model_id: &str) -> Result<Vec<Condition>, RepositoryError> {
        Ok(self.rows(model_id, |d| &d.havings))
    }

    async fn load_orders(&self, model_id: &str) -> Result<Vec<Order>, RepositoryError> {
        Ok(self.rows(model_id, |d| &d.orders))
    }

    async fn load_limit(&self, model_id: &str) -> Result<Option<Limit>, RepositoryError> {
        Ok(self.models.get(model_id).and_then(|d| d.limit))
    }

    async fn load_raw_sql(&self, model_id: &str) -> Result<Option<RawSql>, RepositoryError> {
        Ok(self.models.get(model_id).and_then(|d| d.sql.clone()))
    }
}

#[async_trait]
impl ConnectionSource for Catalog {
    async fn load_connection(
        &self,
        conn_id: &str,
    ) -> Result<Option<ConnectionConfig>, RepositoryError> {
        Ok(self.connections.get(conn_id).cloned())
    }
}
