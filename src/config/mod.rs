//! Configuration management.
//!
//! Settings come from an optional TOML file layered under
//! `CROSSREF_METADATA_*` environment variables (nested keys use `__`,
//! e.g. `CROSSREF_METADATA_CROSSREF__MAILTO`).
//!
//! ```toml
//! [crossref]
//! base_url = "https://api.crossref.org"
//! mailto = "you@example.org"
//! result_limit = 5
//! timeout_secs = 30
//! connect_timeout_secs = 10
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::DEFAULT_TIMEOUT;
use crate::sources::DEFAULT_RESULT_LIMIT;

/// Default API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.crossref.org";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "CROSSREF_METADATA";

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "crossref-metadata.toml";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// CrossRef client settings
    #[serde(default)]
    pub crossref: CrossRefConfig,
}

/// Settings handed to [`crate::sources::CrossRefSource::new`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossRefConfig {
    /// API base URL, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Contact address for CrossRef's polite pool
    #[serde(default)]
    pub mailto: Option<String>,

    /// Override for the User-Agent header
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Rows requested per title search
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,

    /// Default whole-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for CrossRefConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            mailto: None,
            user_agent: None,
            result_limit: default_result_limit(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl CrossRefConfig {
    /// Point the client at a different endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_result_limit() -> usize {
    DEFAULT_RESULT_LIMIT
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(env_source())
        .build()?
        .try_deserialize()
}

fn env_source() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

/// Configuration from environment variables and defaults only
pub fn get_config() -> Result<Config, config::ConfigError> {
    config::Config::builder()
        .add_source(env_source())
        .build()?
        .try_deserialize()
}

/// Find a config file in the working directory or the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join(env!("CARGO_PKG_NAME")).join("config.toml"))
        .filter(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.crossref.base_url, "https://api.crossref.org");
        assert_eq!(config.crossref.result_limit, 5);
        assert_eq!(config.crossref.timeout(), Duration::from_secs(30));
        assert!(config.crossref.mailto.is_none());
    }

    #[test]
    fn test_default_timeout_matches_request_default() {
        let config = get_config().unwrap();
        assert_eq!(config.crossref.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(CrossRefConfig::default().timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[crossref]\nmailto = \"librarian@example.org\"\nresult_limit = 3"
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.crossref.mailto.as_deref(), Some("librarian@example.org"));
        assert_eq!(config.crossref.result_limit, 3);
        assert_eq!(config.crossref.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.crossref.connect_timeout_secs, 10);
    }

    #[test]
    fn test_config_roundtrips_through_toml() {
        let config = Config {
            crossref: CrossRefConfig::default().with_base_url("http://localhost:1234"),
        };
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("[crossref]"));

        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.crossref.base_url, "http://localhost:1234");
    }
}
