use model::metadata::rows::Field;

use crate::{
    error::CompileError,
    query::renderer::{Render, Renderer, apply_func},
};

pub struct SelectClause<'a> {
    pub fields: &'a [Field],
}

impl Render for SelectClause<'_> {
    fn render(&self, r: &mut Renderer) -> Result<(), CompileError> {
        if self.fields.is_empty() {
            r.begin_clause("SELECT *");
            return Ok(());
        }

        let columns = self
            .fields
            .iter()
            .map(|field| {
                let expr = apply_func(&field.agg_func, r.column(&field.source));
                match alias(field) {
                    Some(alias) => format!("{expr} AS {}", r.dialect.quote_identifier(alias)),
                    None => expr,
                }
            })
            .collect::<Vec<_>>()
            .join(", ");

        r.begin_clause("SELECT ");
        r.sql.push_str(&columns);
        Ok(())
    }
}

/// An alias is emitted for computed columns and for titles that rename the column.
fn alias(field: &Field) -> Option<&str> {
    let column = field.source.column.as_str();
    let title = field.show_title.as_str();
    let computed = !field.agg_func.is_empty() || !field.source.func.is_empty();
    if computed || (!title.is_empty() && title != column) {
        Some(if title.is_empty() { column } else { title })
    } else {
        None
    }
}
