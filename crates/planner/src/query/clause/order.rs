use model::metadata::rows::Order;

use crate::{
    error::CompileError,
    query::renderer::{Render, Renderer},
};

pub struct OrderByClause<'a> {
    pub orders: &'a [Order],
}

impl Render for OrderByClause<'_> {
    fn render(&self, r: &mut Renderer) -> Result<(), CompileError> {
        if self.orders.is_empty() {
            return Ok(());
        }
        let columns = self
            .orders
            .iter()
            .map(|o| {
                let direction = o.direction.trim().to_uppercase();
                let direction = if direction.is_empty() { "ASC" } else { direction.as_str() };
                format!("{} {direction}", r.column(&o.source))
            })
            .collect::<Vec<_>>()
            .join(", ");
        r.begin_clause("ORDER BY ");
        r.sql.push_str(&columns);
        Ok(())
    }
}
