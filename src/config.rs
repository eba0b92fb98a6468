//! Configuration management for sitelogofinder
//!
//! Settings are loaded from `./config/sitelogofinder.toml`. Defaults live in
//! the bundled template only. A handful of settings can be overridden from
//! the environment so API keys never have to be written to disk.

use serde::Deserialize;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration file path relative to working directory
pub const CONFIG_PATH: &str = "./config/sitelogofinder.toml";

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = include_str!("../config/sitelogofinder.toml");

pub const ENV_API_KEY: &str = "GOOGLE_API_KEY";
pub const ENV_ENGINE_ID: &str = "SEARCH_ENGINE_ID";
pub const ENV_CHROME_PATH: &str = "CHROME_PATH";
pub const ENV_OUTPUT_DIR: &str = "SITELOGOFINDER_OUTPUT_DIR";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found at {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Configuration field '{field}' cannot be empty")]
    EmptyRequired { field: String },

    #[error("Missing required setting '{field}' (set it in the config file or the {env} environment variable)")]
    MissingSetting { field: String, env: String },

    #[error("Invalid URL in '{field}': {url}")]
    InvalidUrl { field: String, url: String },

    #[error("Invalid CSS selector in '{field}': {selector}")]
    InvalidSelector { field: String, selector: String },
}

/// Which site lookup strategy a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResolverStrategy {
    /// Search API query on school name and address
    Query,
    /// Browser-driven lookup on a directory portal by entity code
    Portal,
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub search: SearchConfig,
    pub portal: PortalConfig,
    pub output: OutputConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Search API (query strategy) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub engine_id: String,
    #[serde(default = "default_host_markers")]
    pub host_markers: Vec<String>,
}

fn default_host_markers() -> Vec<String> {
    vec!["edu".to_string(), "k12".to_string()]
}

/// Directory portal (portal strategy) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub search_input_id: String,
    pub results_selector: String,
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,
    pub primary_link_path: String,
    pub row_selector: String,
    pub nested_selector: String,
    #[serde(default)]
    pub chrome_path: String,
    #[serde(default = "default_sandbox")]
    pub sandbox: bool,
}

fn default_wait_timeout_secs() -> u64 {
    10
}

fn default_sandbox() -> bool {
    true
}

impl PortalConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn chrome_path(&self) -> Option<PathBuf> {
        if self.chrome_path.trim().is_empty() {
            None
        } else {
            Some(PathBuf::from(self.chrome_path.trim()))
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub base_dir: String,
    #[serde(default = "default_table_name")]
    pub table_name: String,
    #[serde(default = "default_logo_dir")]
    pub logo_dir: String,
    #[serde(default)]
    pub overwrite_existing: bool,
}

fn default_table_name() -> String {
    "schools_with_websites.csv".to_string()
}

fn default_logo_dir() -> String {
    "logos".to_string()
}

impl OutputConfig {
    pub fn table_path(&self) -> PathBuf {
        Path::new(&self.base_dir).join(&self.table_name)
    }

    pub fn logo_path(&self) -> PathBuf {
        Path::new(&self.base_dir).join(&self.logo_dir)
    }
}

impl AppConfig {
    /// Load configuration from the default path
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(Path::new(CONFIG_PATH))
    }

    /// Load configuration from a specific path, then apply environment overrides
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let mut config: AppConfig = toml::from_str(&content)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Overlay environment values on top of the file contents.
    /// Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get(ENV_API_KEY) {
            self.search.api_key = v;
        }
        if let Some(v) = get(ENV_ENGINE_ID) {
            self.search.engine_id = v;
        }
        if let Some(v) = get(ENV_CHROME_PATH) {
            self.portal.chrome_path = v;
        }
        if let Some(v) = get(ENV_OUTPUT_DIR) {
            self.output.base_dir = v;
        }
    }

    /// Validate settings shared by every strategy
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.user_agent.is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "http.user_agent".to_string(),
            });
        }
        if self.http.request_timeout_secs == 0 {
            return Err(ConfigError::EmptyRequired {
                field: "http.request_timeout_secs".to_string(),
            });
        }
        if self.output.base_dir.trim().is_empty() {
            return Err(ConfigError::MissingSetting {
                field: "output.base_dir".to_string(),
                env: ENV_OUTPUT_DIR.to_string(),
            });
        }
        if self.portal.wait_timeout_secs == 0 {
            return Err(ConfigError::EmptyRequired {
                field: "portal.wait_timeout_secs".to_string(),
            });
        }
        Ok(())
    }

    /// Check the settings the chosen strategy cannot run without
    pub fn require_for(&self, strategy: ResolverStrategy) -> Result<(), ConfigError> {
        match strategy {
            ResolverStrategy::Query => {
                if self.search.api_key.trim().is_empty() {
                    return Err(ConfigError::MissingSetting {
                        field: "search.api_key".to_string(),
                        env: ENV_API_KEY.to_string(),
                    });
                }
                if self.search.engine_id.trim().is_empty() {
                    return Err(ConfigError::MissingSetting {
                        field: "search.engine_id".to_string(),
                        env: ENV_ENGINE_ID.to_string(),
                    });
                }
                if url::Url::parse(&self.search.endpoint).is_err() {
                    return Err(ConfigError::InvalidUrl {
                        field: "search.endpoint".to_string(),
                        url: self.search.endpoint.clone(),
                    });
                }
            }
            ResolverStrategy::Portal => {
                if self.portal.url.trim().is_empty() {
                    return Err(ConfigError::EmptyRequired {
                        field: "portal.url".to_string(),
                    });
                }
                if url::Url::parse(&self.portal.url).is_err() {
                    return Err(ConfigError::InvalidUrl {
                        field: "portal.url".to_string(),
                        url: self.portal.url.clone(),
                    });
                }
                if self.portal.search_input_id.trim().is_empty() {
                    return Err(ConfigError::EmptyRequired {
                        field: "portal.search_input_id".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Create default configuration file at the standard location
    pub fn create_default_config() -> Result<PathBuf, ConfigError> {
        let path = Path::new(CONFIG_PATH);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::File::create(path)?;
        file.write_all(DEFAULT_CONFIG.as_bytes())?;

        Ok(path.to_path_buf())
    }

    /// Prompt user to create default config (only in interactive mode)
    pub fn prompt_create_config() -> Result<Option<PathBuf>, ConfigError> {
        if !io::stdin().is_terminal() {
            return Ok(None);
        }

        print!("Configuration file not found. Create default config? [Y/n] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim().to_lowercase();

        if input.is_empty() || input == "y" || input == "yes" {
            let path = Self::create_default_config()?;
            Ok(Some(path))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn default_config() -> AppConfig {
        toml::from_str(DEFAULT_CONFIG).expect("default config should parse")
    }

    #[test]
    fn test_default_config_parses() {
        let config: Result<AppConfig, _> = toml::from_str(DEFAULT_CONFIG);
        assert!(config.is_ok(), "Default config should parse: {:?}", config.err());
    }

    #[test]
    fn test_default_config_validates() {
        assert!(default_config().validate().is_ok(), "Default config should validate");
    }

    #[test]
    fn test_default_config_values() {
        let config = default_config();
        assert_eq!(config.search.host_markers, vec!["edu", "k12"]);
        assert_eq!(config.portal.wait_timeout_secs, 10);
        assert_eq!(config.output.table_name, "schools_with_websites.csv");
        assert!(!config.output.overwrite_existing);
        assert_eq!(config.output.logo_path(), Path::new("output").join("logos"));
    }

    #[test]
    fn test_query_strategy_requires_api_key() {
        let config = default_config();
        match config.require_for(ResolverStrategy::Query) {
            Err(ConfigError::MissingSetting { field, env }) => {
                assert_eq!(field, "search.api_key");
                assert_eq!(env, ENV_API_KEY);
            }
            other => panic!("expected MissingSetting, got {:?}", other),
        }
    }

    #[test]
    fn test_env_overrides_fill_query_settings() {
        let mut config = default_config();
        let env: HashMap<&str, &str> = [
            (ENV_API_KEY, "key-123"),
            (ENV_ENGINE_ID, "cx-456"),
            (ENV_OUTPUT_DIR, "/tmp/out"),
        ]
        .into_iter()
        .collect();

        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.search.api_key, "key-123");
        assert_eq!(config.search.engine_id, "cx-456");
        assert_eq!(config.output.base_dir, "/tmp/out");
        assert!(config.require_for(ResolverStrategy::Query).is_ok());
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut config = default_config();
        config.search.api_key = "from-file".to_string();
        config.apply_env_overrides(|k| if k == ENV_API_KEY { Some("   ".to_string()) } else { None });
        assert_eq!(config.search.api_key, "from-file");
    }

    #[test]
    fn test_portal_strategy_requires_url() {
        let config = default_config();
        assert!(matches!(
            config.require_for(ResolverStrategy::Portal),
            Err(ConfigError::EmptyRequired { .. })
        ));
    }

    #[test]
    fn test_portal_strategy_accepts_complete_settings() {
        let mut config = default_config();
        config.portal.url = "https://portal.example.org/search".to_string();
        config.portal.search_input_id = "searchBox".to_string();
        assert!(config.require_for(ResolverStrategy::Portal).is_ok());
    }

    #[test]
    fn test_chrome_path_blank_is_none() {
        let mut config = default_config();
        assert!(config.portal.chrome_path().is_none());
        config.portal.chrome_path = "/usr/bin/chromium".to_string();
        assert_eq!(config.portal.chrome_path(), Some(PathBuf::from("/usr/bin/chromium")));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let result = AppConfig::load_from_path(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
