use model::metadata::rows::Group;

use crate::{
    error::CompileError,
    query::renderer::{Render, Renderer},
};

pub struct GroupByClause<'a> {
    pub groups: &'a [Group],
}

impl Render for GroupByClause<'_> {
    fn render(&self, r: &mut Renderer) -> Result<(), CompileError> {
        if self.groups.is_empty() {
            return Ok(());
        }
        let columns = self
            .groups
            .iter()
            .map(|g| r.column(&g.source))
            .collect::<Vec<_>>()
            .join(", ");
        r.begin_clause("GROUP BY ");
        r.sql.push_str(&columns);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::dialect::MySql;
    use model::metadata::rows::ColumnRef;

    #[test]
    fn test_group_by() {
        let groups = [
            Group {
                source: ColumnRef::new("orders", "status"),
            },
            Group {
                source: ColumnRef::new("orders", "created_at").with_func("DATE"),
            },
        ];
        let mut r = Renderer::new(&MySql);
        GroupByClause { groups: &groups }.render(&mut r).unwrap();
        assert_eq!(
            r.finish().0,
            "GROUP BY `orders`.`status`, DATE(`orders`.`created_at`)"
        );
    }
}
