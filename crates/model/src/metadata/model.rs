use crate::metadata::rows::{Condition, Field, Group, Join, Limit, Order, RawSql, Table};
use serde::{Deserialize, Serialize};

/// How a model's statement is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ModelKind {
    /// Statement assembled clause by clause from metadata rows.
    #[default]
    Metadata,
    /// Stored SQL text with `:name` placeholders.
    RawSql,
}

impl From<i64> for ModelKind {
    fn from(code: i64) -> Self {
        match code {
            1 => ModelKind::RawSql,
            // Unknown codes fall back to the metadata-built path.
            _ => ModelKind::Metadata,
        }
    }
}

impl From<ModelKind> for i64 {
    fn from(kind: ModelKind) -> Self {
        match kind {
            ModelKind::Metadata => 0,
            ModelKind::RawSql => 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Model {
    pub id: String,
    pub tenant_id: String,
    pub conn_id: String,
    pub name: String,
    pub code: String,
    pub kind: ModelKind,
}

/// Everything needed to compile one model, assembled fresh per request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelData {
    pub model: Model,
    pub tables: Vec<Table>,
    pub fields: Vec<Field>,
    pub joins: Vec<Join>,
    pub wheres: Vec<Condition>,
    pub groups: Vec<Group>,
    pub havings: Vec<Condition>,
    pub orders: Vec<Order>,
    pub limit: Option<Limit>,
    pub sql: Option<RawSql>,
}

impl ModelData {
    pub fn new(model: Model) -> Self {
        ModelData {
            model,
            ..Default::default()
        }
    }

    /// The first table flagged as main, else the first table in load order.
    pub fn main_table(&self) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.is_main)
            .or_else(|| self.tables.first())
    }
}
