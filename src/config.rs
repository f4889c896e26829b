//! Production configuration system
//!
//! Provides centralized configuration management with:
//! - Environment variable support
//! - Config file loading (optional)
//! - Runtime defaults
//! - Validation and type safety

use anyhow::{Context, Result};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{info, warn};

/// Default API endpoint when neither a config file nor `PIMS_API_URL` provides one
pub const DEFAULT_API_URL: &str = "http://api.leyuworkpharmacy.com.et";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Remote API configuration
    pub api: ApiConfig,

    /// Refresh timers for the dashboard
    pub refresh: RefreshConfig,

    /// Output configuration
    pub output: OutputConfig,

    /// Paths configuration
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    pub analytics_interval_secs: u64,
    pub last_updated_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub json_pretty: bool,
    pub timestamp_format: String,
    pub color: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub data_directory: PathBuf,
    pub log_directory: PathBuf,
}

impl PathsConfig {
    /// File holding the persisted session (token and cached user)
    pub fn session_file(&self) -> PathBuf {
        self.data_directory.join("session.json")
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RefreshConfig {
    pub fn analytics_interval(&self) -> Duration {
        Duration::from_secs(self.analytics_interval_secs)
    }

    pub fn last_updated_interval(&self) -> Duration {
        Duration::from_secs(self.last_updated_interval_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_directory = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pims-dashboard");

        Self {
            logging: LoggingConfig {
                level: "WARN".to_string(),
                format: "pretty".to_string(),
                output: "console".to_string(),
            },
            api: ApiConfig {
                base_url: DEFAULT_API_URL.to_string(),
                timeout_secs: 30,
            },
            refresh: RefreshConfig {
                analytics_interval_secs: 300,
                last_updated_interval_secs: 60,
            },
            output: OutputConfig {
                json_pretty: false,
                timestamp_format: "%Y-%m-%d %H:%M:%S".to_string(),
                color: true,
            },
            paths: PathsConfig {
                log_directory: data_directory.join("logs"),
                data_directory,
            },
        }
    }
}

impl Config {
    /// Load configuration from environment, file, and defaults
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        // Try to load from config file if it exists
        let config_paths = [
            PathBuf::from("pims-dashboard.toml"),
            PathBuf::from(".pims-dashboard.toml"),
            dirs::config_dir()
                .map(|d| d.join("pims-dashboard").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.is_file() {
                info!(config_file = %path.display(), "Loading configuration from file");
                config = Self::load_from_file(path)?;
                break;
            }
        }

        // Override with environment variables
        config.apply_env_overrides()?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        // Logging overrides
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        // API overrides
        if let Ok(val) = env::var("PIMS_API_URL") {
            self.api.base_url = val;
        }
        if let Ok(val) = env::var("PIMS_API_TIMEOUT_SECS") {
            self.api.timeout_secs = val.parse()
                .context("Invalid PIMS_API_TIMEOUT_SECS")?;
        }

        // Refresh overrides
        if let Ok(val) = env::var("PIMS_REFRESH_SECS") {
            self.refresh.analytics_interval_secs = val.parse()
                .context("Invalid PIMS_REFRESH_SECS")?;
        }
        if let Ok(val) = env::var("PIMS_LAST_UPDATED_SECS") {
            self.refresh.last_updated_interval_secs = val.parse()
                .context("Invalid PIMS_LAST_UPDATED_SECS")?;
        }

        // Output overrides
        if env::var_os("NO_COLOR").is_some() {
            self.output.color = false;
        }

        // Path overrides
        if let Ok(val) = env::var("PIMS_DATA_DIR") {
            self.paths.data_directory = PathBuf::from(val);
        }
        if let Ok(val) = env::var("PIMS_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(val);
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let base_url = self.api.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "API base URL must start with http:// or https://, got {:?}",
                self.api.base_url
            ));
        }

        if self.api.timeout_secs == 0 {
            return Err(anyhow::anyhow!("API timeout must be greater than 0"));
        }

        if self.refresh.analytics_interval_secs == 0 {
            return Err(anyhow::anyhow!("Analytics refresh interval must be greater than 0"));
        }

        if self.refresh.last_updated_interval_secs == 0 {
            return Err(anyhow::anyhow!("Last-updated refresh interval must be greater than 0"));
        }

        if StrftimeItems::new(&self.output.timestamp_format).any(|item| matches!(item, Item::Error)) {
            return Err(anyhow::anyhow!(
                "Invalid timestamp format {:?}",
                self.output.timestamp_format
            ));
        }

        if self.refresh.analytics_interval_secs < 30 {
            warn!(
                analytics_interval_secs = self.refresh.analytics_interval_secs,
                "Analytics refresh interval is very short, the backend only recomputes periodically"
            );
        }

        Ok(())
    }

    /// Save current configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        info!(path = %path.display(), "Configuration saved to file");

        Ok(())
    }
}

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Install an already loaded configuration as the global instance.
///
/// Returns the configuration that ends up installed; if one was set earlier it wins.
pub fn init_config(config: Config) -> &'static Config {
    CONFIG.get_or_init(|| config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "WARN");
        assert_eq!(config.refresh.analytics_interval_secs, 300);
        assert_eq!(config.refresh.last_updated_interval_secs, 60);
        assert!(config.paths.session_file().ends_with("session.json"));
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.refresh.analytics_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.output.timestamp_format = "%Y-%Q".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid timestamp format"));

        config.output.timestamp_format = "%d/%m/%Y %H:%M".to_string();
        assert!(config.validate().is_ok());
    }
}
