use crate::{context::env::EnvContext, error::ConfigError};
use std::time::Duration;

pub const SLOW_QUERY_MS_VAR: &str = "METAQUERY_SLOW_QUERY_MS";
pub const PROBE_TIMEOUT_MS_VAR: &str = "METAQUERY_PROBE_TIMEOUT_MS";
pub const QUERY_TIMEOUT_MS_VAR: &str = "METAQUERY_QUERY_TIMEOUT_MS";
pub const CONNECT_ATTEMPTS_VAR: &str = "METAQUERY_CONNECT_ATTEMPTS";
pub const CONNECT_TIMEOUT_MS_VAR: &str = "METAQUERY_CONNECT_TIMEOUT_MS";

/// Runtime limits for connection handling and statement execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Statements running longer than this are logged at warn level.
    pub slow_query_threshold: Duration,
    pub probe_timeout: Duration,
    pub query_timeout: Duration,
    /// Open attempts per resolve, including the first.
    pub connect_attempts: usize,
    /// Bound on a single driver open, before its first probe.
    pub connect_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slow_query_threshold: Duration::from_secs(1),
            probe_timeout: Duration::from_secs(5),
            query_timeout: Duration::from_secs(30),
            connect_attempts: 2,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by any `METAQUERY_*` variables present in `env`.
    pub fn from_env(env: &EnvContext) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            slow_query_threshold: millis(env, SLOW_QUERY_MS_VAR)?
                .unwrap_or(defaults.slow_query_threshold),
            probe_timeout: millis(env, PROBE_TIMEOUT_MS_VAR)?.unwrap_or(defaults.probe_timeout),
            query_timeout: millis(env, QUERY_TIMEOUT_MS_VAR)?.unwrap_or(defaults.query_timeout),
            connect_attempts: match env.get(CONNECT_ATTEMPTS_VAR) {
                Some(raw) => match raw.parse::<usize>() {
                    Ok(n) if n > 0 => n,
                    _ => return Err(invalid(CONNECT_ATTEMPTS_VAR, raw, "a positive integer")),
                },
                None => defaults.connect_attempts,
            },
            connect_timeout: millis(env, CONNECT_TIMEOUT_MS_VAR)?
                .unwrap_or(defaults.connect_timeout),
        })
    }
}

fn millis(env: &EnvContext, key: &str) -> Result<Option<Duration>, ConfigError> {
    env.get(key)
        .map(|raw| match raw.parse::<u64>() {
            Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
            _ => Err(invalid(key, raw, "milliseconds greater than zero")),
        })
        .transpose()
}

fn invalid(key: &str, value: String, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value,
        expected,
    }
}
