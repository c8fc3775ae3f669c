//! Defines the core rendering trait and context for turning metadata rows into SQL.

use model::{core::value::Value, metadata::rows::ColumnRef};

use crate::{error::CompileError, query::dialect::Dialect};

/// A trait for any clause that can be rendered into a SQL string.
pub trait Render {
    fn render(&self, renderer: &mut Renderer) -> Result<(), CompileError>;
}

/// A context that holds the state during the rendering process.
///
/// It accumulates the SQL string and the parameters, and provides
/// access to the dialect for syntax-specific details.
pub struct Renderer<'a> {
    pub sql: String,
    pub params: Vec<Value>,
    pub dialect: &'a dyn Dialect,
}

impl<'a> Renderer<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self {
            sql: String::new(),
            params: Vec::new(),
            dialect,
        }
    }

    /// Consumes the renderer and returns the final SQL string and parameters.
    pub fn finish(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }

    /// Records a parameter and returns its marker.
    ///
    /// Compiled statements always use `?`; drivers with numbered
    /// placeholders renumber them before preparing.
    pub fn bind(&mut self, value: Value) -> String {
        self.params.push(value);
        "?".to_string()
    }

    pub fn add_param(&mut self, value: Value) {
        let marker = self.bind(value);
        self.sql.push_str(&marker);
    }

    /// Starts a new clause, separated from the previous one by a single space.
    pub fn begin_clause(&mut self, keyword: &str) {
        if !self.sql.is_empty() {
            self.sql.push(' ');
        }
        self.sql.push_str(keyword);
    }

    /// `[schema.]table`, each part quoted.
    pub fn table_name(&self, schema: &str, table: &str) -> String {
        if schema.is_empty() {
            self.dialect.quote_identifier(table)
        } else {
            format!(
                "{}.{}",
                self.dialect.quote_identifier(schema),
                self.dialect.quote_identifier(table)
            )
        }
    }

    /// `[[schema.]table.]column`, each part quoted.
    pub fn qualified_column(&self, schema: &str, table: &str, column: &str) -> String {
        let column = self.dialect.quote_identifier(column);
        if table.is_empty() {
            column
        } else {
            format!("{}.{column}", self.table_name(schema, table))
        }
    }

    /// The column expression with its function wrapper applied.
    pub fn column(&self, col: &ColumnRef) -> String {
        let expr = self.qualified_column(&col.schema, &col.table, &col.column);
        apply_func(&col.func, expr)
    }
}

/// Wraps `expr` with a configured function.
///
/// A template containing `%s` receives the expression in place of its first
/// `%s`, and `%%` collapses to `%`. Any other non-empty text is used as a
/// function name: `FUNC(expr)`.
pub fn apply_func(func: &str, expr: String) -> String {
    if func.trim().is_empty() {
        return expr;
    }
    if !func.contains("%s") {
        return format!("{func}({expr})");
    }

    let mut out = String::with_capacity(func.len() + expr.len());
    let mut substituted = false;
    let mut chars = func.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('%') => {
                chars.next();
                out.push('%');
            }
            Some('s') if !substituted => {
                chars.next();
                out.push_str(&expr);
                substituted = true;
            }
            _ => out.push('%'),
        }
    }
    out
}
