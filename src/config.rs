// src/config.rs

use crate::source::SourceKind;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CrtShConfig {
    #[serde(default = "default_crtsh_url")]
    pub base_url: String,
    #[serde(default = "default_crtsh_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub max_entries: Option<usize>,  // Cap on rows kept per lookup
}

fn default_crtsh_url() -> String { "https://crt.sh".to_string() }
fn default_crtsh_timeout() -> u64 { 120 }  // crt.sh can be slow

impl Default for CrtShConfig {
    fn default() -> Self {
        Self {
            base_url: default_crtsh_url(),
            timeout_secs: default_crtsh_timeout(),
            max_entries: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchApiConfig {
    #[serde(default = "default_search_api_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_search_api_timeout")]
    pub timeout_secs: u64,
}

fn default_search_api_url() -> String { "https://api.certsearch.example".to_string() }
fn default_search_api_timeout() -> u64 { 60 }

impl Default for SearchApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_search_api_url(),
            api_token: None,
            timeout_secs: default_search_api_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub crtsh: CrtShConfig,
    #[serde(default)]
    pub search_api: SearchApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&contents)?;
        Ok(cfg)
    }

    /// Load from `path` if given, otherwise use defaults
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_from_valid_toml() {
        let toml_content = r#"
[source]
kind = "search_api"

[crtsh]
base_url = "https://crt.example.org"
timeout_secs = 30
max_entries = 500

[search_api]
base_url = "https://search.example.org"
api_token = "secret-token"
timeout_secs = 15

[logging]
level = "debug"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::from_file(temp_file.path()).unwrap();

        assert_eq!(config.source.kind, SourceKind::SearchApi);
        assert_eq!(config.crtsh.base_url, "https://crt.example.org");
        assert_eq!(config.crtsh.timeout_secs, 30);
        assert_eq!(config.crtsh.max_entries, Some(500));
        assert_eq!(config.search_api.base_url, "https://search.example.org");
        assert_eq!(config.search_api.api_token, Some("secret-token".to_string()));
        assert_eq!(config.search_api.timeout_secs, 15);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_config_empty_toml_uses_defaults() {
        let temp_file = NamedTempFile::new().unwrap();

        let config = Config::from_file(temp_file.path()).unwrap();

        assert_eq!(config.source.kind, SourceKind::Crtsh);
        assert_eq!(config.crtsh.base_url, "https://crt.sh");
        assert_eq!(config.crtsh.timeout_secs, 120);
        assert_eq!(config.crtsh.max_entries, None);
        assert_eq!(config.search_api.api_token, None);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_partial_section() {
        let toml_content = r#"
[crtsh]
max_entries = 10
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::from_file(temp_file.path()).unwrap();

        // Unset fields in a present section still default
        assert_eq!(config.crtsh.base_url, "https://crt.sh");
        assert_eq!(config.crtsh.max_entries, Some(10));
    }

    #[test]
    fn test_config_invalid_toml() {
        let toml_content = "invalid toml content {{{";

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let result = Config::from_file(temp_file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_config_unknown_source_kind() {
        let toml_content = r#"
[source]
kind = "censys"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        assert!(Config::from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_config_nonexistent_file() {
        let result = Config::from_file(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_without_path() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.source.kind, SourceKind::Crtsh);
    }
}
