use serde::{Deserialize, Serialize};
use std::fmt;

/// SQL family a connection targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DialectKind {
    MySql,
    Postgres,
    Sqlite,
    Other(String),
}

impl DialectKind {
    /// Maps a stored dialect tag to a known family. Matching ignores case.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => DialectKind::MySql,
            "postgres" | "postgresql" | "pg" => DialectKind::Postgres,
            "sqlite" | "sqlite3" => DialectKind::Sqlite,
            other => DialectKind::Other(other.to_string()),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, DialectKind::Other(_))
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialectKind::MySql => write!(f, "mysql"),
            DialectKind::Postgres => write!(f, "postgres"),
            DialectKind::Sqlite => write!(f, "sqlite"),
            DialectKind::Other(tag) => write!(f, "{tag}"),
        }
    }
}

/// Connection metadata as stored by the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub id: String,
    pub name: String,
    /// Dialect tag, e.g. `mysql`, `postgres`, `sqlite`.
    pub kind: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Full DSN. Preferred over the discrete fields when non-empty.
    pub dsn: String,
}

impl ConnectionConfig {
    pub fn dialect(&self) -> DialectKind {
        DialectKind::from_tag(&self.kind)
    }

    pub fn has_dsn(&self) -> bool {
        !self.dsn.trim().is_empty()
    }
}
