use std::collections::HashMap;

use model::metadata::rows::Join;

use crate::{
    error::CompileError,
    query::renderer::{Render, Renderer, apply_func},
};

/// Parent id shared by the top-level joins.
pub const ROOT_JOIN: &str = "0";

pub struct JoinClause<'a> {
    pub joins: &'a [Join],
}

/// The join forest as an arena: nodes stay in `joins`, edges index into it.
struct JoinTree<'a> {
    joins: &'a [Join],
    children: HashMap<&'a str, Vec<usize>>,
}

impl<'a> JoinTree<'a> {
    fn build(joins: &'a [Join]) -> Self {
        let mut children: HashMap<&str, Vec<usize>> = HashMap::new();
        for (idx, join) in joins.iter().enumerate() {
            children.entry(join.parent_id.as_str()).or_default().push(idx);
        }
        JoinTree { joins, children }
    }

    fn children_of(&self, id: &str) -> &[usize] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the id of a join that is its own ancestor, if any.
    fn find_cycle(&self) -> Option<&'a str> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Active,
            Done,
        }

        let mut marks: HashMap<&str, Mark> = HashMap::new();
        for join in self.joins {
            let start = join.id.as_str();
            if marks.contains_key(start) {
                continue;
            }
            marks.insert(start, Mark::Active);
            let mut stack: Vec<(&str, usize)> = vec![(start, 0)];

            while let Some(top) = stack.last_mut() {
                let (id, next) = *top;
                let kids = self.children_of(id);
                if next < kids.len() {
                    top.1 += 1;
                    let child = self.joins[kids[next]].id.as_str();
                    match marks.get(child) {
                        Some(Mark::Active) => return Some(child),
                        Some(Mark::Done) => {}
                        None => {
                            marks.insert(child, Mark::Active);
                            stack.push((child, 0));
                        }
                    }
                } else {
                    marks.insert(id, Mark::Done);
                    stack.pop();
                }
            }
        }
        None
    }

    /// Depth-first order from the root, siblings kept in load order.
    /// Joins not reachable from the root are skipped.
    fn walk(&self) -> Vec<&'a Join> {
        let mut ordered = Vec::with_capacity(self.joins.len());
        let mut stack: Vec<usize> = self.children_of(ROOT_JOIN).iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            let join = &self.joins[idx];
            ordered.push(join);
            stack.extend(self.children_of(&join.id).iter().rev().copied());
        }
        ordered
    }
}

impl Render for JoinClause<'_> {
    fn render(&self, r: &mut Renderer) -> Result<(), CompileError> {
        if self.joins.is_empty() {
            return Ok(());
        }
        let tree = JoinTree::build(self.joins);
        if let Some(id) = tree.find_cycle() {
            return Err(CompileError::JoinCycle(id.to_string()));
        }

        for join in tree.walk() {
            let mut fragment = join_keyword(&join.join_type);
            fragment.push(' ');
            fragment.push_str(&r.table_name(&join.join_schema, &join.join_table));
            if let Some(on) = on_condition(r, join) {
                fragment.push_str(" ON ");
                fragment.push_str(&on);
            }
            r.begin_clause(&fragment);
        }
        Ok(())
    }
}

fn join_keyword(join_type: &str) -> String {
    let upper = join_type.trim().to_uppercase();
    if upper.is_empty() {
        "JOIN".to_string()
    } else if upper.ends_with("JOIN") {
        upper
    } else {
        format!("{upper} JOIN")
    }
}

/// Condition rows win over the column pair, which wins over `raw_on`.
/// With none of them the join renders with no ON, so a bare `JOIN` is a
/// cross join and an outer join is left for the database to reject.
fn on_condition(r: &Renderer, join: &Join) -> Option<String> {
    if !join.conditions.is_empty() {
        let mut on = String::new();
        for (i, cond) in join.conditions.iter().enumerate() {
            if i > 0 {
                on.push(' ');
                on.push_str(&logical_operator(&cond.operator1));
                on.push(' ');
            }
            let left = apply_func(
                &cond.func,
                r.qualified_column(&join.schema, &join.table, &cond.column),
            );
            let right = apply_func(
                &cond.join_func,
                r.qualified_column(&join.join_schema, &join.join_table, &cond.join_column),
            );
            on.push_str(&cond.brackets1);
            on.push_str(&format!("{left} {} {right}", comparison(&cond.operator2)));
            on.push_str(&cond.brackets2);
        }
        return Some(on);
    }

    if !join.column.is_empty() && !join.join_column.is_empty() {
        let left = apply_func(
            &join.func,
            r.qualified_column(&join.schema, &join.table, &join.column),
        );
        let right = apply_func(
            &join.join_func,
            r.qualified_column(&join.join_schema, &join.join_table, &join.join_column),
        );
        return Some(format!("{left} {} {right}", comparison(&join.operator)));
    }

    let raw = join.raw_on.trim();
    (!raw.is_empty()).then(|| raw.to_string())
}

fn logical_operator(op: &str) -> String {
    let op = op.trim().to_uppercase();
    if op.is_empty() { "AND".to_string() } else { op }
}

fn comparison(op: &str) -> &str {
    let op = op.trim();
    if op.is_empty() { "=" } else { op }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::dialect::MySql;
    use model::metadata::rows::JoinCondition;

    fn join(id: &str, parent: &str, table: &str, join_table: &str) -> Join {
        Join {
            id: id.into(),
            parent_id: parent.into(),
            join_type: "left".into(),
            table: table.into(),
            column: format!("{join_table}_id"),
            join_table: join_table.into(),
            join_column: "id".into(),
            ..Default::default()
        }
    }

    fn render(joins: &[Join]) -> Result<String, CompileError> {
        let mut r = Renderer::new(&MySql);
        JoinClause { joins }.render(&mut r)?;
        Ok(r.finish().0)
    }

    #[test]
    fn test_join_tree_depth_first() {
        let joins = vec![
            join("2", "1", "customers", "regions"),
            join("1", "0", "orders", "customers"),
            join("3", "0", "orders", "shops"),
        ];
        assert_eq!(
            render(&joins).unwrap(),
            "LEFT JOIN `customers` ON `orders`.`customers_id` = `customers`.`id` \
             LEFT JOIN `regions` ON `customers`.`regions_id` = `regions`.`id` \
             LEFT JOIN `shops` ON `orders`.`shops_id` = `shops`.`id`"
        );
    }

    #[test]
    fn test_unreachable_joins_are_skipped() {
        let joins = vec![join("1", "0", "a", "b"), join("9", "42", "b", "c")];
        assert_eq!(
            render(&joins).unwrap(),
            "LEFT JOIN `b` ON `a`.`b_id` = `b`.`id`"
        );
    }

    #[test]
    fn test_cycles_are_rejected() {
        let joins = vec![join("1", "2", "a", "b"), join("2", "1", "b", "c")];
        assert!(matches!(render(&joins), Err(CompileError::JoinCycle(_))));

        let joins = vec![join("1", "0", "a", "b"), join("5", "5", "b", "c")];
        assert_eq!(render(&joins), Err(CompileError::JoinCycle("5".into())));
    }

    #[test]
    fn test_multi_condition_on_clause() {
        let mut j = join("1", "0", "orders", "prices");
        j.join_type = "INNER JOIN".into();
        j.conditions = vec![
            JoinCondition {
                column: "sku".into(),
                join_column: "sku".into(),
                ..Default::default()
            },
            JoinCondition {
                operator1: "or".into(),
                brackets1: "(".into(),
                column: "created_at".into(),
                func: "DATE".into(),
                operator2: ">=".into(),
                join_column: "valid_from".into(),
                brackets2: ")".into(),
                ..Default::default()
            },
        ];
        assert_eq!(
            render(&[j]).unwrap(),
            "INNER JOIN `prices` ON `orders`.`sku` = `prices`.`sku` \
             OR (DATE(`orders`.`created_at`) >= `prices`.`valid_from`)"
        );
    }

    #[test]
    fn test_raw_on_fallback() {
        let j = Join {
            id: "1".into(),
            parent_id: "0".into(),
            join_type: "right".into(),
            join_table: "audit".into(),
            raw_on: "audit.ref = orders.id".into(),
            ..Default::default()
        };
        assert_eq!(
            render(&[j]).unwrap(),
            "RIGHT JOIN `audit` ON audit.ref = orders.id"
        );
    }

    #[test]
    fn test_join_without_condition_has_no_on() {
        let bare = Join {
            id: "1".into(),
            parent_id: "0".into(),
            table: "orders".into(),
            join_table: "currencies".into(),
            ..Default::default()
        };
        assert_eq!(render(&[bare.clone()]).unwrap(), "JOIN `currencies`");

        let outer = Join {
            join_type: "left".into(),
            column: "currency".into(),
            ..bare
        };
        assert_eq!(render(&[outer]).unwrap(), "LEFT JOIN `currencies`");
    }
}
