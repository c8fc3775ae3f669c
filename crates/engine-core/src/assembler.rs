use crate::{error::EngineError, repository::MetadataRepository};
use model::metadata::model::ModelData;
use std::sync::Arc;
use tracing::debug;

/// Loads every metadata row of a model into one `ModelData`.
pub struct ModelAssembler {
    repository: Arc<dyn MetadataRepository>,
}

impl ModelAssembler {
    pub fn new(repository: Arc<dyn MetadataRepository>) -> Self {
        ModelAssembler { repository }
    }

    /// Maps a model code onto its ID.
    pub async fn resolve_code(&self, code: &str) -> Result<String, EngineError> {
        let model = self
            .repository
            .load_model_by_code(code)
            .await?
            .ok_or_else(|| EngineError::ModelCodeNotFound(code.to_string()))?;
        debug!(%code, model_id = %model.id, "Resolved model code");
        Ok(model.id)
    }

    pub async fn assemble(&self, model_id: &str) -> Result<ModelData, EngineError> {
        let repo = self.repository.as_ref();
        let model = repo
            .load_model(model_id)
            .await?
            .ok_or_else(|| EngineError::ModelNotFound(model_id.to_string()))?;

        let (tables, fields, joins, wheres, groups, havings, orders, limit, sql) = futures::try_join!(
            repo.load_tables(model_id),
            repo.load_fields(model_id),
            repo.load_joins(model_id),
            repo.load_wheres(model_id),
            repo.load_groups(model_id),
            repo.load_havings(model_id),
            repo.load_orders(model_id),
            repo.load_limit(model_id),
            repo.load_raw_sql(model_id),
        )?;

        debug!(
            %model_id,
            kind = ?model.kind,
            tables = tables.len(),
            fields = fields.len(),
            joins = joins.len(),
            conditions = wheres.len() + havings.len(),
            "Assembled model"
        );

        Ok(ModelData {
            model,
            tables,
            fields,
            joins,
            wheres,
            groups,
            havings,
            orders,
            limit,
            sql,
        })
    }
}
