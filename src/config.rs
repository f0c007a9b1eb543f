//! Configuration file support for podcast-catalog.
//!
//! This module provides functionality for loading and saving user preferences
//! from a TOML configuration file.

use crate::error::{AppError, Result};
use crate::fetch::{
    DEFAULT_BATCH_DELAY_MS, DEFAULT_CONCURRENCY, DEFAULT_FETCH_PAGE_SIZE, FetchSettings,
};
use crate::pagination::PageSize;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable that overrides the configured access token.
pub const TOKEN_ENV_VAR: &str = "PODCAST_CATALOG_TOKEN";

/// User configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the upstream Web API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Bearer token for the upstream API
    #[serde(default)]
    pub access_token: Option<String>,

    /// Market (ISO country code) sent with episode requests
    #[serde(default)]
    pub market: Option<String>,

    /// Episodes per screen: a number or "unlimited"
    #[serde(default = "default_page_size")]
    pub page_size: String,

    /// Episodes requested per upstream call
    #[serde(default = "default_fetch_page_size")]
    pub fetch_page_size: usize,

    /// Upstream calls in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Pause between request batches, in milliseconds
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Use upstream search for episode-number lookups
    #[serde(default)]
    pub api_search: bool,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn default_api_base() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_page_size() -> String {
    "10".to_string()
}

fn default_fetch_page_size() -> usize {
    DEFAULT_FETCH_PAGE_SIZE
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_batch_delay_ms() -> u64 {
    DEFAULT_BATCH_DELAY_MS
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self {
            api_base: default_api_base(),
            access_token: None,
            market: None,
            page_size: default_page_size(),
            fetch_page_size: default_fetch_page_size(),
            concurrency: default_concurrency(),
            batch_delay_ms: default_batch_delay_ms(),
            api_search: false,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Get the path to the config file.
    ///
    /// Returns ~/.config/podcast-catalog/config.toml on Linux,
    /// or a platform-appropriate location on other systems.
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "Could not find config directory")
            })?
            .join("podcast-catalog");

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from disk.
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::get_config_path()?;

        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        let path = Self::get_config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Create a default config file if one doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn create_default_if_missing() -> Result<PathBuf> {
        let path = Self::get_config_path()?;

        if !path.exists() {
            let config = Self::new();
            config.save()?;
        }

        Ok(path)
    }

    /// Orchestrator settings derived from this config.
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            page_size: self.fetch_page_size.max(1),
            concurrency: self.concurrency.max(1),
            batch_delay: Duration::from_millis(self.batch_delay_ms),
        }
    }

    /// The configured display page size.
    pub fn default_page_size(&self) -> Result<PageSize> {
        self.page_size
            .parse()
            .map_err(|e: AppError| AppError::Config(e.to_string()))
    }

    /// Access token from the environment, falling back to the config file.
    pub fn resolve_access_token(&self) -> Option<String> {
        self.resolve_access_token_from(env::var(TOKEN_ENV_VAR).ok())
    }

    /// Like [`Self::resolve_access_token`], with the environment value given.
    pub fn resolve_access_token_from(&self, env_value: Option<String>) -> Option<String> {
        env_value
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.access_token.clone())
            .filter(|t| !t.trim().is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_config_has_defaults() {
        let config = Config::new();
        assert_eq!(config.api_base, "https://api.spotify.com/v1");
        assert_eq!(config.page_size, "10");
        assert_eq!(config.fetch_page_size, 50);
        assert_eq!(config.concurrency, 5);
        assert_eq!(config.batch_delay_ms, 100);
        assert!(!config.api_search);
        assert!(config.access_token.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config {
            market: Some("US".to_string()),
            page_size: "unlimited".to_string(),
            api_search: true,
            ..Config::new()
        };

        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("market = \"US\""));
        assert!(toml_str.contains("page_size = \"unlimited\""));
        assert!(toml_str.contains("api_search = true"));
    }

    #[test]
    fn test_config_partial_deserialization() {
        // Only specify some fields, rest should use defaults
        let toml_str = r#"
            page_size = "25"
            concurrency = 2
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default_page_size().unwrap(), PageSize::Limited(25));
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.fetch_page_size, 50); // default
        assert_eq!(config.batch_delay_ms, 100); // default
    }

    #[test]
    fn test_fetch_settings() {
        let config = Config {
            fetch_page_size: 0,
            concurrency: 3,
            batch_delay_ms: 250,
            ..Config::new()
        };
        let settings = config.fetch_settings();
        assert_eq!(settings.page_size, 1);
        assert_eq!(settings.concurrency, 3);
        assert_eq!(settings.batch_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_token_resolution_order() {
        let config = Config {
            access_token: Some("from-file".to_string()),
            ..Config::new()
        };
        assert_eq!(
            config.resolve_access_token_from(Some("from-env".to_string())),
            Some("from-env".to_string())
        );
        assert_eq!(
            config.resolve_access_token_from(Some("  ".to_string())),
            Some("from-file".to_string())
        );
        assert_eq!(
            config.resolve_access_token_from(None),
            Some("from-file".to_string())
        );

        let blank = Config {
            access_token: Some(String::new()),
            ..Config::new()
        };
        assert_eq!(blank.resolve_access_token_from(None), None);
    }

    #[test]
    fn test_invalid_page_size_is_config_error() {
        let config = Config {
            page_size: "lots".to_string(),
            ..Config::new()
        };
        assert!(matches!(config.default_page_size(), Err(AppError::Config(_))));
    }
}
