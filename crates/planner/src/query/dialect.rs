//! Defines the `Dialect` trait for database-specific SQL syntax.

use model::execution::connection::DialectKind;

pub trait Dialect: Send + Sync {
    /// Wraps an identifier (like a table or column name) in the correct
    /// quotation marks for the dialect.
    ///
    /// - MySQL uses backticks: `` `my_column` ``
    /// - PostgreSQL and SQLite use double quotes: `"my_column"`
    fn quote_identifier(&self, ident: &str) -> String;

    /// Returns the placeholder the driver expects for the parameter at `index`.
    ///
    /// - PostgreSQL uses `$1`, `$2`, etc.
    /// - MySQL and SQLite use `?`
    fn get_placeholder(&self, index: usize) -> String;

    /// Joins string pieces into one SQL string expression.
    fn concat(&self, parts: &[String]) -> String {
        format!("({})", parts.join(" || "))
    }

    /// Returns the name of the dialect (e.g., "PostgreSQL", "MySQL").
    fn name(&self) -> String;

    fn kind(&self) -> DialectKind;
}

/// Picks the dialect for a connection family. `None` for unsupported families.
pub fn for_kind(kind: &DialectKind) -> Option<&'static dyn Dialect> {
    match kind {
        DialectKind::MySql => Some(&MySql),
        DialectKind::Postgres => Some(&Postgres),
        DialectKind::Sqlite => Some(&Sqlite),
        DialectKind::Other(_) => None,
    }
}

fn quote_with(ident: &str, quote: char) -> String {
    let escaped = ident.replace(quote, &format!("{quote}{quote}"));
    format!("{quote}{escaped}{quote}")
}

#[derive(Debug, Clone)]
pub struct Postgres;

impl Dialect for Postgres {
    fn quote_identifier(&self, ident: &str) -> String {
        quote_with(ident, '"')
    }

    fn get_placeholder(&self, index: usize) -> String {
        // PostgreSQL uses $1, $2, etc.
        format!("${}", index + 1)
    }

    fn name(&self) -> String {
        "PostgreSQL".into()
    }

    fn kind(&self) -> DialectKind {
        DialectKind::Postgres
    }
}

#[derive(Debug, Clone)]
pub struct MySql;

impl Dialect for MySql {
    fn quote_identifier(&self, ident: &str) -> String {
        quote_with(ident, '`')
    }

    fn get_placeholder(&self, _index: usize) -> String {
        "?".into()
    }

    fn concat(&self, parts: &[String]) -> String {
        format!("CONCAT({})", parts.join(", "))
    }

    fn name(&self) -> String {
        "MySQL".into()
    }

    fn kind(&self) -> DialectKind {
        DialectKind::MySql
    }
}

#[derive(Debug, Clone)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn quote_identifier(&self, ident: &str) -> String {
        quote_with(ident, '"')
    }

    fn get_placeholder(&self, _index: usize) -> String {
        "?".into()
    }

    fn name(&self) -> String {
        "SQLite".into()
    }

    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoting() {
        assert_eq!(MySql.quote_identifier("users"), "`users`");
        assert_eq!(Postgres.quote_identifier("users"), r#""users""#);
        assert_eq!(Sqlite.quote_identifier(r#"we"ird"#), r#""we""ird""#);
    }

    #[test]
    fn test_placeholders_and_concat() {
        assert_eq!(Postgres.get_placeholder(0), "$1");
        assert_eq!(MySql.get_placeholder(4), "?");
        let parts = vec!["'%'".to_string(), "?".to_string()];
        assert_eq!(MySql.concat(&parts), "CONCAT('%', ?)");
        assert_eq!(Sqlite.concat(&parts), "('%' || ?)");
    }

    #[test]
    fn test_for_kind() {
        assert_eq!(for_kind(&DialectKind::Postgres).map(|d| d.name()), Some("PostgreSQL".into()));
        assert!(for_kind(&DialectKind::Other("oracle".into())).is_none());
    }
}
