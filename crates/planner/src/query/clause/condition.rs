use model::{
    core::{
        params::{ParamValue, Params},
        value::Value,
    },
    metadata::rows::{Condition, ListFilter},
};
use std::borrow::Cow;

use crate::{
    error::CompileError,
    query::renderer::{Render, Renderer},
};

/// WHERE and HAVING share one rendering; only the keyword differs.
pub struct ConditionClause<'a> {
    pub keyword: &'static str,
    pub conditions: &'a [Condition],
    pub params: &'a Params,
}

impl<'a> ConditionClause<'a> {
    pub fn filter(conditions: &'a [Condition], params: &'a Params) -> Self {
        ConditionClause {
            keyword: "WHERE",
            conditions,
            params,
        }
    }

    pub fn having(conditions: &'a [Condition], params: &'a Params) -> Self {
        ConditionClause {
            keyword: "HAVING",
            conditions,
            params,
        }
    }

    /// The caller's value for this condition, if one was supplied.
    /// A `null` param counts as absent.
    fn override_for(&self, cond: &Condition) -> Option<&'a ParamValue> {
        if cond.param_key.is_empty() {
            return None;
        }
        self.params
            .get(&cond.param_key)
            .filter(|p| !matches!(p, ParamValue::Null))
    }
}

impl Render for ConditionClause<'_> {
    fn render(&self, r: &mut Renderer) -> Result<(), CompileError> {
        if self.conditions.is_empty() {
            return Ok(());
        }
        r.begin_clause(self.keyword);
        r.sql.push(' ');

        for (i, cond) in self.conditions.iter().enumerate() {
            if i > 0 {
                let op = cond.operator1.trim().to_uppercase();
                r.sql.push(' ');
                r.sql.push_str(if op.is_empty() { "AND" } else { &op });
                r.sql.push(' ');
            }
            r.sql.push_str(&cond.brackets1);
            render_predicate(r, cond, self.override_for(cond));
            r.sql.push_str(&cond.brackets2);
        }
        Ok(())
    }
}

/// Operators a caller-supplied filter may use. Stored metadata is not limited to these.
const FILTER_OPERATORS: [&str; 13] = [
    "=", "!=", "<>", "<", "<=", ">", ">=", "LIKE", "NOT LIKE", "IN", "NOT IN", "IS NULL",
    "IS NOT NULL",
];

/// Stored WHERE rows with caller filters ANDed on.
///
/// Stored rows are bracketed as a group first so their own ORs cannot
/// absorb a filter.
pub fn merge_filters<'a>(
    wheres: &'a [Condition],
    filters: &[ListFilter],
) -> Result<Cow<'a, [Condition]>, CompileError> {
    if filters.is_empty() {
        return Ok(Cow::Borrowed(wheres));
    }
    let mut merged = wheres.to_vec();
    if let Some(first) = merged.first_mut() {
        first.brackets1.insert(0, '(');
    }
    if let Some(last) = merged.last_mut() {
        last.brackets2.push(')');
    }
    for filter in filters {
        let op = normalize_operator(&filter.operator);
        if !FILTER_OPERATORS.contains(&op.as_str()) {
            return Err(CompileError::UnsupportedFilterOperator(filter.operator.clone()));
        }
        merged.push(Condition::from(filter));
    }
    Ok(Cow::Owned(merged))
}

fn normalize_operator(op: &str) -> String {
    let op = op.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
    if op.is_empty() { "=".to_string() } else { op }
}

fn render_predicate(r: &mut Renderer, cond: &Condition, param: Option<&ParamValue>) {
    let expr = r.column(&cond.source);
    let op = normalize_operator(&cond.operator2);

    match op.as_str() {
        "IS NULL" | "IS NOT NULL" => {
            r.sql.push_str(&format!("{expr} {op}"));
        }
        "IN" | "NOT IN" => {
            let items = in_items(cond, param);
            let markers = items
                .into_iter()
                .map(|item| r.bind(Value::String(item)))
                .collect::<Vec<_>>()
                .join(", ");
            r.sql.push_str(&format!("{expr} {op} ({markers})"));
        }
        "BETWEEN" | "NOT BETWEEN" => {
            let (low, high) = between_bounds(cond, param);
            r.sql.push_str(&format!("{expr} {op} "));
            r.add_param(Value::String(low));
            r.sql.push_str(" AND ");
            r.add_param(Value::String(high));
        }
        "LIKE" | "NOT LIKE" => {
            let value = scalar_or_literal(param, &cond.value1);
            r.sql.push_str(&format!("{expr} {op} "));
            r.add_param(Value::String(format!("%{value}%")));
        }
        _ => {
            let value = scalar_or_literal(param, &cond.value1);
            r.sql.push_str(&format!("{expr} {op} "));
            r.add_param(Value::String(value));
        }
    }
}

/// Scalar overrides replace the literal; lists and ranges do not apply here.
fn scalar_or_literal(param: Option<&ParamValue>, literal: &str) -> String {
    param
        .and_then(ParamValue::scalar_text)
        .unwrap_or_else(|| literal.to_string())
}

fn split_list(text: &str) -> Vec<String> {
    text.split(',').map(|s| s.trim().to_string()).collect()
}

fn in_items(cond: &Condition, param: Option<&ParamValue>) -> Vec<String> {
    if let Some(ParamValue::List(items)) = param {
        let items: Vec<String> = items.iter().filter_map(ParamValue::scalar_text).collect();
        if !items.is_empty() {
            return items;
        }
    }
    split_list(&scalar_or_literal(param, &cond.value1))
}

fn between_bounds(cond: &Condition, param: Option<&ParamValue>) -> (String, String) {
    let mut low = cond.value1.clone();
    let mut high = cond.value2.clone();

    match param {
        Some(ParamValue::List(items)) if items.len() >= 2 => {
            if let Some(v) = items[0].scalar_text() {
                low = v;
            }
            if let Some(v) = items[1].scalar_text() {
                high = v;
            }
        }
        Some(ParamValue::Range { min, max }) => {
            if let Some(v) = min.as_deref().and_then(ParamValue::scalar_text) {
                low = v;
            }
            if let Some(v) = max.as_deref().and_then(ParamValue::scalar_text) {
                high = v;
            }
        }
        Some(scalar) => {
            if let Some(v) = scalar.scalar_text() {
                low = v.clone();
                high = v;
            }
        }
        None => {}
    }
    (low, high)
}
