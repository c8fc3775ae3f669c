//! Catalog queries over an open adapter: schemas, tables, columns, indexes
//! and a row preview.

use crate::{error::AdapterError, sql::base::adapter::SqlAdapter};
use model::{
    core::value::Value, execution::connection::DialectKind, records::row::Record,
};
use planner::query::dialect::{self, Dialect};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

struct CatalogSql {
    schemas: &'static str,
    tables: &'static str,
    columns: &'static str,
    indexes: &'static str,
}

static MYSQL_SQL: CatalogSql = CatalogSql {
    schemas: include_str!("sql/mysql/schemas.sql"),
    tables: include_str!("sql/mysql/tables.sql"),
    columns: include_str!("sql/mysql/columns.sql"),
    indexes: include_str!("sql/mysql/indexes.sql"),
};

static POSTGRES_SQL: CatalogSql = CatalogSql {
    schemas: include_str!("sql/postgres/schemas.sql"),
    tables: include_str!("sql/postgres/tables.sql"),
    columns: include_str!("sql/postgres/columns.sql"),
    indexes: include_str!("sql/postgres/indexes.sql"),
};

static SQLITE_SQL: CatalogSql = CatalogSql {
    schemas: include_str!("sql/sqlite/schemas.sql"),
    tables: include_str!("sql/sqlite/tables.sql"),
    columns: include_str!("sql/sqlite/columns.sql"),
    indexes: include_str!("sql/sqlite/indexes.sql"),
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    pub schema: String,
    pub name: String,
    /// `BASE TABLE` or `VIEW`.
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub primary_key: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexInfo {
    pub name: String,
    pub column: String,
    pub unique: bool,
}

pub struct Introspector {
    adapter: Arc<dyn SqlAdapter>,
    dialect: &'static dyn Dialect,
    catalog: &'static CatalogSql,
}

impl Introspector {
    pub fn new(adapter: Arc<dyn SqlAdapter>) -> Result<Self, AdapterError> {
        let kind = adapter.kind();
        let catalog = match &kind {
            DialectKind::MySql => &MYSQL_SQL,
            DialectKind::Postgres => &POSTGRES_SQL,
            DialectKind::Sqlite => &SQLITE_SQL,
            DialectKind::Other(tag) => {
                return Err(AdapterError::UnsupportedDialect(tag.clone()));
            }
        };
        let dialect = dialect::for_kind(&kind)
            .ok_or_else(|| AdapterError::UnsupportedDialect(kind.to_string()))?;
        Ok(Introspector {
            adapter,
            dialect,
            catalog,
        })
    }

    pub async fn test_connection(&self) -> Result<(), AdapterError> {
        self.adapter.ping().await?;
        info!(dialect = %self.dialect.name(), "Connection test succeeded");
        Ok(())
    }

    pub async fn list_schemas(&self) -> Result<Vec<String>, AdapterError> {
        let rows = self.adapter.query(self.catalog.schemas, &[]).await?;
        Ok(rows.iter().map(|row| text(row, "schema_name")).collect())
    }

    /// Tables of `schema`, or of the connection's current schema when `None`.
    pub async fn list_tables(&self, schema: Option<&str>) -> Result<Vec<TableInfo>, AdapterError> {
        let arg = schema.map_or(Value::Null, Value::from);
        let rows = self.adapter.query(self.catalog.tables, &[arg]).await?;
        Ok(rows
            .iter()
            .map(|row| TableInfo {
                schema: text(row, "table_schema"),
                name: text(row, "table_name"),
                kind: text(row, "table_type"),
            })
            .collect())
    }

    pub async fn list_columns(&self, table: &str) -> Result<Vec<ColumnInfo>, AdapterError> {
        let rows = self
            .adapter
            .query(self.catalog.columns, &[Value::from(table)])
            .await?;
        Ok(rows
            .iter()
            .map(|row| ColumnInfo {
                name: text(row, "column_name"),
                data_type: text(row, "data_type"),
                nullable: text(row, "is_nullable").eq_ignore_ascii_case("YES"),
                default: row.get_value("column_default").as_string(),
                primary_key: text(row, "column_key") == "PRI",
            })
            .collect())
    }

    pub async fn list_indexes(&self, table: &str) -> Result<Vec<IndexInfo>, AdapterError> {
        let rows = self
            .adapter
            .query(self.catalog.indexes, &[Value::from(table)])
            .await?;
        Ok(rows
            .iter()
            .map(|row| IndexInfo {
                name: text(row, "index_name"),
                column: text(row, "column_name"),
                unique: row.get_value("is_unique").as_bool().unwrap_or(false),
            })
            .collect())
    }

    /// First `limit` rows of `table`. A `schema.table` name is quoted per part.
    pub async fn preview_rows(&self, table: &str, limit: u32) -> Result<Vec<Record>, AdapterError> {
        let name = table
            .split('.')
            .map(|part| self.dialect.quote_identifier(part))
            .collect::<Vec<_>>()
            .join(".");
        let sql = format!("SELECT * FROM {name} LIMIT {limit}");
        debug!("Previewing rows: {sql}");
        Ok(self.adapter.query(&sql, &[]).await?)
    }

    pub async fn close(&self) -> Result<(), AdapterError> {
        Ok(self.adapter.close().await?)
    }
}

fn text(row: &Record, column: &str) -> String {
    row.get_value(column).as_string().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::sqlite::adapter::SqliteAdapter;

    async fn sample_db(dir: &tempfile::TempDir) -> Arc<dyn SqlAdapter> {
        let path = dir.path().join("catalog.db");
        let adapter = SqliteAdapter::connect(&path.display().to_string())
            .await
            .unwrap();
        for sql in [
            "CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT NOT NULL, status TEXT DEFAULT 'new')",
            "CREATE UNIQUE INDEX users_email ON users (email)",
            "CREATE VIEW active_users AS SELECT * FROM users WHERE status = 'active'",
            "INSERT INTO users (email) VALUES ('a@x.io'), ('b@x.io'), ('c@x.io')",
        ] {
            adapter.query(sql, &[]).await.unwrap();
        }
        Arc::new(adapter)
    }

    #[tokio::test]
    async fn test_sqlite_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let introspector = Introspector::new(sample_db(&dir).await).unwrap();

        introspector.test_connection().await.unwrap();
        assert_eq!(introspector.list_schemas().await.unwrap(), vec!["main"]);

        let tables = introspector.list_tables(None).await.unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["active_users", "users"]);
        assert_eq!(tables[0].kind, "VIEW");
        assert!(introspector.list_tables(Some("other")).await.unwrap().is_empty());

        let columns = introspector.list_columns("users").await.unwrap();
        assert_eq!(columns.len(), 3);
        assert!(columns[0].primary_key);
        assert!(!columns[1].nullable);
        assert_eq!(columns[2].default.as_deref(), Some("'new'"));

        let indexes = introspector.list_indexes("users").await.unwrap();
        assert_eq!(
            indexes,
            vec![IndexInfo {
                name: "users_email".into(),
                column: "email".into(),
                unique: true,
            }]
        );

        let rows = introspector.preview_rows("users", 2).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get_value("email"), Value::from("a@x.io"));

        introspector.close().await.unwrap();
    }
}
