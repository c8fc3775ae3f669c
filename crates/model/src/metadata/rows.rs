use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Table {
    pub schema: String,
    pub table: String,
    pub is_main: bool,
}

/// A possibly qualified column with an optional function wrapper.
///
/// `func` either contains a `%s` placeholder for the column expression
/// (e.g. `DATE_FORMAT(%s, '%%Y-%%m')`) or is a bare function name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnRef {
    pub schema: String,
    pub table: String,
    pub column: String,
    pub func: String,
}

impl ColumnRef {
    pub fn new(table: &str, column: &str) -> Self {
        ColumnRef {
            table: table.into(),
            column: column.into(),
            ..Default::default()
        }
    }

    pub fn with_func(mut self, func: &str) -> Self {
        self.func = func.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Field {
    #[serde(flatten)]
    pub source: ColumnRef,
    pub agg_func: String,
    pub show_title: String,
}

/// One predicate of an ON clause between a join's table and its joined table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinCondition {
    /// `AND` / `OR`, ignored on the first condition.
    pub operator1: String,
    pub brackets1: String,
    pub column: String,
    pub func: String,
    /// Comparison operator, `=` when empty.
    pub operator2: String,
    pub join_column: String,
    pub join_func: String,
    pub brackets2: String,
}

/// A node of the join forest. Roots carry the parent id `"0"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Join {
    pub id: String,
    pub parent_id: String,
    /// `LEFT`, `INNER`, `RIGHT JOIN`, ...
    pub join_type: String,
    /// Left side of the ON clause.
    pub schema: String,
    pub table: String,
    pub column: String,
    pub func: String,
    pub operator: String,
    /// The table being joined in.
    pub join_schema: String,
    pub join_table: String,
    pub join_column: String,
    pub join_func: String,
    pub conditions: Vec<JoinCondition>,
    /// Verbatim ON text, used when no column pair or conditions are configured.
    pub raw_on: String,
}

/// A WHERE or HAVING predicate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
    pub operator1: String,
    pub brackets1: String,
    #[serde(flatten)]
    pub source: ColumnRef,
    pub operator2: String,
    pub value1: String,
    pub value2: String,
    pub brackets2: String,
    /// Name of a runtime param that overrides the literal values.
    pub param_key: String,
}

impl Condition {
    pub fn new(source: ColumnRef, operator: &str, value1: &str) -> Self {
        Condition {
            source,
            operator2: operator.into(),
            value1: value1.into(),
            ..Default::default()
        }
    }

    pub fn with_param(mut self, key: &str) -> Self {
        self.param_key = key.into();
        self
    }
}

/// A caller-supplied predicate ANDed onto a model's stored WHERE rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListFilter {
    pub table_name: String,
    pub column_name: String,
    /// `=` when empty.
    pub operator: String,
    pub value: String,
}

impl ListFilter {
    pub fn new(table_name: &str, column_name: &str, operator: &str, value: &str) -> Self {
        ListFilter {
            table_name: table_name.into(),
            column_name: column_name.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }
}

impl From<&ListFilter> for Condition {
    fn from(filter: &ListFilter) -> Self {
        Condition {
            operator1: "AND".into(),
            ..Condition::new(
                ColumnRef::new(&filter.table_name, &filter.column_name),
                &filter.operator,
                &filter.value,
            )
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    #[serde(flatten)]
    pub source: ColumnRef,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    #[serde(flatten)]
    pub source: ColumnRef,
    /// `ASC` when empty.
    pub direction: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limit {
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSql {
    pub content: String,
}
