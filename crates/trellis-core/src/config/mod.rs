//! Configuration management for Trellis.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `trellis.toml` file
//! 3. User config `~/.config/trellis/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

mod defaults;

pub use defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog storage configuration.
    pub storage: StorageConfig,

    /// External tracker sync configuration.
    pub sync: SyncConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./trellis.toml` (project local)
    /// 2. `~/.config/trellis/config.toml` (user config)
    /// 3. Falls back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new("trellis.toml").exists() {
            return Self::from_file("trellis.toml");
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("trellis").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("TRELLIS_CATALOG") {
            self.storage.catalog_file = path;
        }

        if let Ok(url) = std::env::var("TRELLIS_SYNC_URL") {
            self.sync.base_url = Some(url);
        }
        if let Ok(token) = std::env::var("TRELLIS_SYNC_TOKEN") {
            self.sync.api_token = Some(token);
        }
        if let Ok(size) = std::env::var("TRELLIS_SYNC_PAGE_SIZE") {
            if let Ok(n) = size.parse() {
                self.sync.page_size = n;
            }
        }
        if let Ok(policy) = std::env::var("TRELLIS_SYNC_POLICY") {
            self.sync.policy = policy;
        }
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Catalog storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the catalog JSON file.
    pub catalog_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            catalog_file: DEFAULT_CATALOG_FILE.to_string(),
        }
    }
}

impl StorageConfig {
    /// Get the catalog file path.
    pub fn catalog_path(&self) -> PathBuf {
        PathBuf::from(&self.catalog_file)
    }
}

/// External tracker sync configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Base URL of the tracker API (for REST sources).
    pub base_url: Option<String>,

    /// API token (can also be set via TRELLIS_SYNC_TOKEN).
    #[serde(skip_serializing)]
    pub api_token: Option<String>,

    /// Page size for paginated fetches.
    pub page_size: usize,

    /// Default merge policy: "smart", "local_priority" or "external_priority".
    pub policy: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_token: None,
            page_size: DEFAULT_SYNC_PAGE_SIZE,
            policy: DEFAULT_SYNC_POLICY.to_string(),
        }
    }
}

impl SyncConfig {
    /// Get the API token from config or environment.
    pub fn api_token_or_env(&self) -> Option<String> {
        self.api_token
            .clone()
            .or_else(|| std::env::var("TRELLIS_SYNC_TOKEN").ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.storage.catalog_file, DEFAULT_CATALOG_FILE);
        assert_eq!(config.sync.page_size, DEFAULT_SYNC_PAGE_SIZE);
        assert_eq!(config.sync.policy, DEFAULT_SYNC_POLICY);
    }

    #[test]
    fn test_config_to_toml() {
        let toml_str = Config::default_config_string();
        assert!(toml_str.contains("[storage]"));
        assert!(toml_str.contains("[sync]"));
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
[storage]
catalog_file = "data/catalog.json"

[sync]
base_url = "https://tracker.example.com/api"
page_size = 25
policy = "local_priority"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.storage.catalog_file, "data/catalog.json");
        assert_eq!(
            config.sync.base_url.as_deref(),
            Some("https://tracker.example.com/api")
        );
        assert_eq!(config.sync.page_size, 25);
        assert_eq!(config.sync.policy, "local_priority");
    }
}
