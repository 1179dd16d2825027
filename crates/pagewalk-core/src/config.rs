//! Configuration management for pagewalk.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Highest number of decimal places progress values are rounded to.
const MAX_DECIMAL_PLACES: u32 = 10;

/// Main application configuration.
///
/// This is loaded from `~/.config/pagewalk/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Request concurrency settings
    pub requests: RequestsConfig,
    /// Page source settings
    pub source: SourceConfig,
    /// Progress reporting settings
    pub progress: ProgressConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML or fail validation
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, falling back to defaults if
    /// the file does not exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            let contents = fs::read_to_string(path)?;
            let config: Self = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `PAGEWALK_MAX_REQUESTS`: Override the concurrent request limit (0 disables it)
    /// - `PAGEWALK_USE_HTTPS`: Override the URL scheme (true/false)
    /// - `PAGEWALK_DOMAIN`: Override the listing host
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup. Unparseable values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("PAGEWALK_MAX_REQUESTS") {
            if let Ok(max) = val.parse() {
                self.requests.max_concurrent_requests = max;
                tracing::debug!("Override requests.max_concurrent_requests from env: {}", max);
            }
        }

        if let Some(val) = lookup("PAGEWALK_USE_HTTPS") {
            if let Ok(use_https) = val.parse() {
                self.source.use_https = use_https;
                tracing::debug!("Override source.use_https from env: {}", use_https);
            }
        }

        if let Some(domain) = lookup("PAGEWALK_DOMAIN") {
            if !domain.trim().is_empty() {
                tracing::debug!("Override source.domain from env: {}", domain);
                self.source.domain = domain.trim().to_string();
            }
        }
    }

    /// Check values that serde cannot check on its own.
    pub fn validate(&self) -> ConfigResult<()> {
        let domain = self.source.domain.trim();
        if domain.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "source.domain".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if domain.contains("://") {
            return Err(ConfigError::InvalidValue {
                field: "source.domain".to_string(),
                reason: "must not include a scheme, use source.use_https".to_string(),
            });
        }
        if self.source.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "source.timeout_secs".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.progress.decimal_places > MAX_DECIMAL_PLACES {
            return Err(ConfigError::InvalidValue {
                field: "progress.decimal_places".to_string(),
                reason: format!("must be at most {MAX_DECIMAL_PLACES}"),
            });
        }
        Ok(())
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let config_dir = path.parent().ok_or_else(|| ConfigError::InvalidValue {
            field: "config_path".to_string(),
            reason: "no parent directory".to_string(),
        })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/pagewalk/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("net", "pagewalk", "pagewalk").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Request concurrency settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestsConfig {
    /// Maximum number of page fetches in flight at once (0 = unlimited)
    pub max_concurrent_requests: usize,
}

impl Default for RequestsConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 2,
        }
    }
}

/// Page source settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Host (and optional port) serving the listings, without scheme
    pub domain: String,
    /// Use `https://` rather than `http://`
    pub use_https: bool,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            domain: "www.furaffinity.net".to_string(),
            use_https: true,
            timeout_secs: 30,
            user_agent: format!("pagewalk/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Progress reporting settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Decimal places progress percentages are rounded to when read
    pub decimal_places: u32,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { decimal_places: 2 }
    }
}
