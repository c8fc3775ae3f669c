use connectors::error::AdapterError;
use engine_core::error::{ConfigError, EngineError, RepositoryError};
use model::execution::errors::ParamError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid engine setting: {0}")]
    EngineConfig(#[from] ConfigError),

    #[error("Failed to load the catalog: {0}")]
    Catalog(#[from] RepositoryError),

    #[error("Invalid --params: {0}")]
    Params(#[from] ParamError),

    #[error("Invalid --filters: {0}")]
    Filters(String),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Introspection failed: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Shutdown requested")]
    ShutdownRequested,
}
