use crate::{
    error::AdapterError,
    sql::{
        base::adapter::SqlAdapter, mysql::adapter::MySqlAdapter, postgres::adapter::PgAdapter,
        sqlite::adapter::SqliteAdapter,
    },
};
use model::execution::connection::{ConnectionConfig, DialectKind};
use std::sync::Arc;
use tracing::debug;
use url::{Url, form_urlencoded};

#[derive(Clone)]
pub enum Adapter {
    MySql(MySqlAdapter),
    Postgres(PgAdapter),
    Sqlite(SqliteAdapter),
}

impl Adapter {
    pub async fn sql(kind: &DialectKind, conn_str: &str) -> Result<Self, AdapterError> {
        match kind {
            DialectKind::MySql => {
                let adapter = MySqlAdapter::connect(conn_str).await?;
                Ok(Adapter::MySql(adapter))
            }
            DialectKind::Postgres => {
                let adapter = PgAdapter::connect(conn_str).await?;
                Ok(Adapter::Postgres(adapter))
            }
            DialectKind::Sqlite => {
                let adapter = SqliteAdapter::connect(conn_str).await?;
                Ok(Adapter::Sqlite(adapter))
            }
            DialectKind::Other(tag) => Err(AdapterError::UnsupportedDialect(tag.clone())),
        }
    }

    /// Opens the adapter described by stored connection metadata.
    pub async fn from_config(config: &ConnectionConfig) -> Result<Self, AdapterError> {
        let kind = config.dialect();
        let url = connection_url(config)?;
        Self::sql(&kind, &url).await
    }

    pub fn get_sql(&self) -> &(dyn SqlAdapter + Send + Sync) {
        match self {
            Adapter::MySql(adapter) => adapter,
            Adapter::Postgres(adapter) => adapter,
            Adapter::Sqlite(adapter) => adapter,
        }
    }

    pub fn into_shared(self) -> Arc<dyn SqlAdapter> {
        match self {
            Adapter::MySql(adapter) => Arc::new(adapter),
            Adapter::Postgres(adapter) => Arc::new(adapter),
            Adapter::Sqlite(adapter) => Arc::new(adapter),
        }
    }
}

/// The DSN to open for `config`. A stored DSN wins; otherwise one is
/// assembled from host, port, credentials and database.
pub fn connection_url(config: &ConnectionConfig) -> Result<String, AdapterError> {
    let kind = config.dialect();
    if config.has_dsn() {
        let dsn = config.dsn.trim();
        return match kind {
            DialectKind::MySql if !dsn.contains("://") => mysql_driver_dsn(dsn, config),
            _ => Ok(dsn.to_string()),
        };
    }

    match kind {
        DialectKind::MySql => server_url("mysql", 3306, config),
        DialectKind::Postgres => server_url("postgres", 5432, config),
        DialectKind::Sqlite => sqlite_url(config),
        DialectKind::Other(tag) => Err(AdapterError::UnsupportedDialect(tag)),
    }
}

fn invalid(config: &ConnectionConfig, what: &str) -> AdapterError {
    AdapterError::InvalidConfig(format!("connection {} has an invalid {what}", config.id))
}

fn server_url(
    scheme: &str,
    default_port: u16,
    config: &ConnectionConfig,
) -> Result<String, AdapterError> {
    let host = config.host.trim();
    if host.is_empty() {
        return Err(AdapterError::InvalidConfig(format!(
            "connection {} has neither a DSN nor a host",
            config.id
        )));
    }
    let port = if config.port == 0 {
        default_port
    } else {
        config.port
    };

    let mut url =
        Url::parse(&format!("{scheme}://{host}")).map_err(|_| invalid(config, "host"))?;
    url.set_port(Some(port)).map_err(|_| invalid(config, "port"))?;
    set_credentials(&mut url, &config.user, &config.password, config)?;
    url.set_path(&config.database);
    Ok(url.into())
}

fn set_credentials(
    url: &mut Url,
    user: &str,
    password: &str,
    config: &ConnectionConfig,
) -> Result<(), AdapterError> {
    if user.is_empty() {
        return Ok(());
    }
    url.set_username(user).map_err(|_| invalid(config, "user"))?;
    if !password.is_empty() {
        url.set_password(Some(password))
            .map_err(|_| invalid(config, "password"))?;
    }
    Ok(())
}

fn sqlite_url(config: &ConnectionConfig) -> Result<String, AdapterError> {
    let database = config.database.trim();
    if database.is_empty() {
        return Err(AdapterError::InvalidConfig(format!(
            "connection {} has no SQLite database path",
            config.id
        )));
    }
    if database == ":memory:" {
        return Ok("sqlite::memory:".to_string());
    }

    let path = std::path::absolute(database).map_err(|_| invalid(config, "SQLite path"))?;
    let mut url = Url::parse("sqlite://").map_err(|_| invalid(config, "SQLite path"))?;
    url.set_path(&path.to_string_lossy());
    Ok(url.into())
}

/// Rewrites a Go driver DSN, `user:pass@tcp(host:port)/db?params`, into a
/// `mysql://` URL. Driver parameters have no equivalent and are dropped.
fn mysql_driver_dsn(dsn: &str, config: &ConnectionConfig) -> Result<String, AdapterError> {
    let (rest, query) = dsn.split_once('?').unwrap_or((dsn, ""));
    let (head, database) = rest
        .rsplit_once('/')
        .ok_or_else(|| invalid(config, "MySQL DSN"))?;
    let (userinfo, address) = head.rsplit_once('@').unwrap_or(("", head));
    let (user, password) = userinfo.split_once(':').unwrap_or((userinfo, ""));

    let host = match address {
        "" => "127.0.0.1:3306",
        addr => addr
            .strip_prefix("tcp(")
            .and_then(|a| a.strip_suffix(')'))
            .ok_or_else(|| invalid(config, "MySQL DSN address"))?,
    };

    let mut url = Url::parse(&format!("mysql://{host}"))
        .map_err(|_| invalid(config, "MySQL DSN address"))?;
    if url.port().is_none() {
        url.set_port(Some(3306))
            .map_err(|_| invalid(config, "MySQL DSN address"))?;
    }
    set_credentials(&mut url, user, password, config)?;
    url.set_path(database);

    let dropped: Vec<String> = form_urlencoded::parse(query.as_bytes())
        .map(|(key, _)| key.into_owned())
        .collect();
    if !dropped.is_empty() {
        debug!(conn_id = %config.id, ?dropped, "Ignoring Go driver DSN parameters");
    }
    Ok(url.into())
}
