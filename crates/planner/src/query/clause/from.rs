use model::metadata::model::ModelData;

use crate::{
    error::CompileError,
    query::renderer::{Render, Renderer},
};

pub struct FromClause<'a> {
    pub data: &'a ModelData,
}

impl Render for FromClause<'_> {
    fn render(&self, r: &mut Renderer) -> Result<(), CompileError> {
        let table = self
            .data
            .main_table()
            .ok_or_else(|| CompileError::NoMainTable(self.data.model.id.clone()))?;
        let name = r.table_name(&table.schema, &table.table);
        r.begin_clause("FROM ");
        r.sql.push_str(&name);
        Ok(())
    }
}
