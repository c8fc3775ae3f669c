use model::{core::params::Params, metadata::rows::Limit};

use crate::{
    error::CompileError,
    query::renderer::{Render, Renderer},
};

pub struct LimitClause<'a> {
    pub limit: Option<&'a Limit>,
    pub params: &'a Params,
}

impl LimitClause<'_> {
    /// Effective `(limit, offset)`, or `None` when no clause is emitted.
    ///
    /// Numeric `limit` / `page` params greater than zero override the
    /// configured values.
    pub fn window(&self) -> Option<(i64, i64)> {
        let configured = self.limit?;
        if configured.limit == 0 && configured.page == 0 {
            return None;
        }

        let override_of = |key: &str| {
            self.params
                .get(key)
                .and_then(|p| p.as_i64())
                .filter(|v| *v > 0)
        };
        let limit = override_of("limit").unwrap_or(configured.limit);
        let page = override_of("page").unwrap_or(configured.page);

        if limit <= 0 {
            return None;
        }
        let offset = if page > 1 { (page - 1).saturating_mul(limit) } else { 0 };
        Some((limit, offset))
    }
}

impl Render for LimitClause<'_> {
    fn render(&self, r: &mut Renderer) -> Result<(), CompileError> {
        match self.window() {
            Some((limit, offset)) if offset > 0 => {
                r.begin_clause(&format!("LIMIT {limit} OFFSET {offset}"))
            }
            Some((limit, _)) => r.begin_clause(&format!("LIMIT {limit}")),
            None => {}
        }
        Ok(())
    }
}
