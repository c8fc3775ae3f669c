//! Collaborators the engine reads model and connection metadata from.

pub mod catalog;

use crate::error::RepositoryError;
use async_trait::async_trait;
use model::{
    execution::connection::ConnectionConfig,
    metadata::{
        model::Model,
        rows::{Condition, Field, Group, Join, Limit, Order, RawSql, Table},
    },
};

/// Row loaders keyed by model ID. Empty collections are not errors.
#[async_trait]
pub trait MetadataRepository: Send + Sync {
    async fn load_model(&self, model_id: &str) -> Result<Option<Model>, RepositoryError>;
    /// The model whose `code` matches, if any. Empty codes match nothing.
    async fn load_model_by_code(&self, code: &str) -> Result<Option<Model>, RepositoryError>;
    async fn load_tables(&self, model_id: &str) -> Result<Vec<Table>, RepositoryError>;
    async fn load_fields(&self, model_id: &str) -> Result<Vec<Field>, RepositoryError>;
    async fn load_joins(&self, model_id: &str) -> Result<Vec<Join>, RepositoryError>;
    async fn load_wheres(&self, model_id: &str) -> Result<Vec<Condition>, RepositoryError>;
    async fn load_groups(&self, model_id: &str) -> Result<Vec<Group>, RepositoryError>;
    async fn load_havings(&self, model_id: &str) -> Result<Vec<Condition>, RepositoryError>;
    async fn load_orders(&self, model_id: &str) -> Result<Vec<Order>, RepositoryError>;
    async fn load_limit(&self, model_id: &str) -> Result<Option<Limit>, RepositoryError>;
    async fn load_raw_sql(&self, model_id: &str) -> Result<Option<RawSql>, RepositoryError>;
}

#[async_trait]
pub trait ConnectionSource: Send + Sync {
    async fn load_connection(
        &self,
        conn_id: &str,
    ) -> Result<Option<ConnectionConfig>, RepositoryError>;
}
