//! Configuration file support for sideline.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `SIDELINE_`, nested keys joined
//!    with `__`, e.g. `SIDELINE_API__TOKEN`)
//! 3. Config file (./sideline.toml, then ~/.config/sideline/config.toml)
//! 4. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [api]
//! base_url = "https://api.example.com/v1"
//! token = "eyJ..."  # or use SIDELINE_API__TOKEN env var
//! timeout_secs = 30
//!
//! [feed]
//! page_size = 20
//! requests_per_second = 5
//! empty_statuses = [400, 404]  # overrides the per-list defaults
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;

use sideline::feed::DEFAULT_PAGE_SIZE;
use sideline::fetch::DEFAULT_REQUESTS_PER_SECOND;

/// Default API base URL (a local development server).
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API connection settings.
    pub api: ApiConfig,
    /// Feed loading defaults.
    pub feed: FeedConfig,
}

/// API connection settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL the list endpoint paths are appended to.
    pub base_url: String,
    /// Bearer token for authenticated lists.
    /// Can also be set via SIDELINE_API__TOKEN environment variable.
    pub token: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Feed loading defaults.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Items requested per page.
    pub page_size: u32,
    /// Client-side request budget.
    pub requests_per_second: u32,
    /// Statuses treated as "no more data". `None` uses each list's defaults.
    pub empty_statuses: Option<Vec<u16>>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            empty_statuses: None,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/sideline/config.toml)
    /// 3. Local config file (./sideline.toml)
    /// 4. Environment variables with SIDELINE_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from("sideline.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./sideline.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // e.g., SIDELINE_API__BASE_URL -> api.base_url
        builder = builder.add_source(
            Environment::with_prefix("SIDELINE")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("feed.empty_statuses")
                .try_parsing(true),
        );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Get the API token, ignoring blank values.
    pub fn api_token(&self) -> Option<String> {
        self.api
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }

    /// Get the per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs.max(1))
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "sideline").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml_content: &str) -> Config {
        let settings = ConfigBuilder::builder()
            .add_source(config::File::from_str(toml_content, FileFormat::Toml))
            .build()
            .unwrap();

        settings.try_deserialize().unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert!(config.api.token.is_none());
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.feed.page_size, 20);
        assert_eq!(config.feed.requests_per_second, 5);
        assert!(config.feed.empty_statuses.is_none());
    }

    #[test]
    fn test_config_builder_with_defaults() {
        let settings = ConfigBuilder::builder().build().unwrap();
        let config: Config = settings.try_deserialize().unwrap_or_default();

        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.feed.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_full_config_parsing() {
        let config = from_toml(
            r#"
            [api]
            base_url = "https://api.example.com/v1"
            token = "secret"
            timeout_secs = 5

            [feed]
            page_size = 50
            requests_per_second = 2
            empty_statuses = [404]
        "#,
        );

        assert_eq!(config.api.base_url, "https://api.example.com/v1");
        assert_eq!(config.api_token(), Some("secret".to_string()));
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.feed.page_size, 50);
        assert_eq!(config.feed.requests_per_second, 2);
        assert_eq!(config.feed.empty_statuses, Some(vec![404]));
    }

    #[test]
    fn test_config_builder_partial_override() {
        let config = from_toml(
            r#"
            [feed]
            page_size = 10
        "#,
        );

        assert_eq!(config.feed.page_size, 10);
        // Other values should be defaults
        assert_eq!(config.feed.requests_per_second, DEFAULT_REQUESTS_PER_SECOND);
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let config = from_toml(
            r#"
            [api]
            token = "   "
        "#,
        );
        assert!(config.api_token().is_none());
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let config = from_toml(
            r#"
            [api]
            timeout_secs = 0
        "#,
        );
        assert_eq!(config.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_default_config_path_ends_with_config_toml() {
        if let Some(path) = Config::default_config_path() {
            assert!(path.ends_with("config.toml"));
        }
    }
}
