use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use engine_core::context::env::EnvContext;
use tracing::debug;

use crate::error::CliError;

pub const CATALOG_VAR: &str = "METAQUERY_CATALOG";

/// Environment variables from the process, optionally overlaid by a `.env` file.
#[derive(Debug, Clone)]
pub struct EnvManager {
    vars: HashMap<String, String>,
    sensitive_patterns: Vec<String>,
}

impl EnvManager {
    pub fn new() -> Self {
        Self {
            vars: std::env::vars().collect(),
            sensitive_patterns: Self::default_sensitive_patterns(),
        }
    }

    /// Load variables from a .env file. File values win over the process env.
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), CliError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read env file {}: {}", path.display(), e))
        })?;

        self.parse_env_content(&content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn to_context(&self) -> EnvContext {
        EnvContext::from_vars(self.vars.clone())
    }

    /// `--catalog` first, then `METAQUERY_CATALOG`, then `~/.metaquery/catalog.json`.
    pub fn catalog_path(&self, flag: Option<&str>) -> Result<PathBuf, CliError> {
        if let Some(path) = flag.or_else(|| self.get(CATALOG_VAR)).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not determine home directory".into()))?;
        Ok(home.join(".metaquery").join("catalog.json"))
    }

    fn parse_env_content(&mut self, content: &str) -> Result<(), CliError> {
        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line.strip_prefix("export ").unwrap_or(line);

            let Some((key, value)) = line.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid env file: malformed line {} (expected KEY=VALUE)",
                    line_num + 1
                )));
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(CliError::Config(format!(
                    "Invalid env file: empty key at line {}",
                    line_num + 1
                )));
            }

            let value = Self::unquote_value(value);
            if self.is_sensitive(key) {
                debug!(%key, "Loaded env value (redacted)");
            } else {
                debug!(%key, %value, "Loaded env value");
            }
            self.vars.insert(key.to_string(), value);
        }

        Ok(())
    }

    fn unquote_value(value: &str) -> String {
        let value = value.trim();
        for quote in ['"', '\''] {
            if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
                return value[1..value.len() - 1].to_string();
            }
        }
        value.to_string()
    }

    fn is_sensitive(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.sensitive_patterns.iter().any(|p| key.contains(p.as_str()))
    }

    fn default_sensitive_patterns() -> Vec<String> {
        ["password", "passwd", "secret", "token", "dsn", "credential"]
            .iter()
            .map(|p| p.to_string())
            .collect()
    }
}

impl Default for EnvManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn empty() -> EnvManager {
        EnvManager {
            vars: HashMap::new(),
            sensitive_patterns: EnvManager::default_sensitive_patterns(),
        }
    }

    #[test]
    fn test_parse_basic_env() {
        let mut env = empty();
        let content = r#"
# Comment
KEY1=value1
export KEY2 = value2
        "#;

        env.parse_env_content(content).unwrap();
        assert_eq!(env.get("KEY1"), Some("value1"));
        assert_eq!(env.get("KEY2"), Some("value2"));
    }

    #[test]
    fn test_parse_quoted_values() {
        let mut env = empty();
        let content = r#"
QUOTED="value with spaces"
SINGLE='single quoted'
URL=mysql://u:p@h/db?x=1
        "#;

        env.parse_env_content(content).unwrap();
        assert_eq!(env.get("QUOTED"), Some("value with spaces"));
        assert_eq!(env.get("SINGLE"), Some("single quoted"));
        assert_eq!(env.get("URL"), Some("mysql://u:p@h/db?x=1"));
    }

    #[test]
    fn test_invalid_env_format() {
        let mut env = empty();
        assert!(env.parse_env_content("INVALID LINE WITHOUT EQUALS").is_err());
        assert!(env.parse_env_content("=value").is_err());
    }

    #[test]
    fn test_catalog_path_precedence() {
        let mut env = empty();
        assert!(env.catalog_path(None).unwrap().ends_with(".metaquery/catalog.json"));

        env.vars.insert(CATALOG_VAR.into(), "/srv/catalog.json".into());
        assert_eq!(env.catalog_path(None).unwrap(), PathBuf::from("/srv/catalog.json"));
        assert_eq!(
            env.catalog_path(Some("local.json")).unwrap(),
            PathBuf::from("local.json")
        );
    }

    #[test]
    fn test_env_file_feeds_engine_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "METAQUERY_QUERY_TIMEOUT_MS=750").unwrap();

        let mut env = empty();
        env.load_from_file(file.path()).unwrap();
        let config = engine_core::config::EngineConfig::from_env(&env.to_context()).unwrap();
        assert_eq!(config.query_timeout, std::time::Duration::from_millis(750));
    }

    #[test]
    fn test_sensitive_keys() {
        let env = empty();
        assert!(env.is_sensitive("DB_PASSWORD"));
        assert!(!env.is_sensitive("METAQUERY_CATALOG"));
    }
}
