//! Configuration loading and validation for certwatch
//!
//! The watcher is driven by a single JSON file (`config.json` by default)
//! with flat credential/target keys and a nested `log_settings` mapping.
//!
//! # Behavior
//!
//! - Missing file: a default configuration is written to disk and the load
//!   is reported as newly created, so the caller can stop and tell the user
//!   to fill in credentials before anything touches the network.
//! - Unreadable file: replaced with a fresh default (logged as a warning)
//!   and likewise reported as newly created.
//! - Existing file: loaded with serde defaults backfilling any missing keys,
//!   then saved back so the file on disk always carries the full schema.
//!
//! # Example
//!
//! ```no_run
//! use certwatch_config::Config;
//!
//! let loaded = Config::load_or_create("config.json".as_ref())?;
//! if loaded.newly_created {
//!     println!("fill in {} and re-run", loaded.path.display());
//!     return Ok(());
//! }
//! loaded.config.validate()?;
//! # Ok::<(), certwatch_config::ConfigError>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Log level names accepted in `log_settings`.
pub const LOG_LEVELS: &[&str] = &["debug", "info", "warning", "error", "critical"];

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read or write config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Watcher configuration, mirrored one-to-one in `config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the order service.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Account username, combined with the token in the bearer header.
    #[serde(default = "default_username")]
    pub username: String,
    /// Static API token.
    #[serde(default = "default_token")]
    pub token: String,
    /// Message language: `auto`, `en_us` or `zh_cn`.
    #[serde(default = "default_language")]
    pub language: String,
    /// Mark of the order to watch.
    #[serde(default)]
    pub target_mark: String,
    /// apihz time source credential: caller id.
    #[serde(default = "default_apihz_id")]
    pub apihz_id: String,
    /// apihz time source credential: caller key.
    #[serde(default = "default_apihz_key")]
    pub apihz_key: String,
    /// Renew when fewer than this many whole days remain.
    #[serde(default = "default_renew_before_days")]
    pub renew_before_days: i64,
    /// Directory the certificate pair is written under, keyed by mark.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default)]
    pub log_settings: LogSettings,
}

/// Nested logging sub-mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    /// Directory for the date-stamped log file.
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    /// Minimum level for console output.
    #[serde(default = "default_console_level")]
    pub console_level: String,
    /// Minimum level for file output.
    #[serde(default = "default_file_level")]
    pub file_level: String,
}

fn default_api_url() -> String {
    "https://api.xwamp.com".to_string()
}

fn default_username() -> String {
    "user@example.com".to_string()
}

fn default_token() -> String {
    "your_token_here".to_string()
}

fn default_language() -> String {
    "auto".to_string()
}

fn default_apihz_id() -> String {
    "88888888".to_string()
}

fn default_apihz_key() -> String {
    "88888888".to_string()
}

fn default_renew_before_days() -> i64 {
    14
}

fn default_output_dir() -> String {
    "certs".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_console_level() -> String {
    "info".to_string()
}

fn default_file_level() -> String {
    "debug".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            username: default_username(),
            token: default_token(),
            language: default_language(),
            target_mark: String::new(),
            apihz_id: default_apihz_id(),
            apihz_key: default_apihz_key(),
            renew_before_days: default_renew_before_days(),
            output_dir: default_output_dir(),
            log_settings: LogSettings::default(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            console_level: default_console_level(),
            file_level: default_file_level(),
        }
    }
}

/// Result of [`Config::load_or_create`].
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    /// Path the configuration was read from (or written to).
    pub path: PathBuf,
    /// Whether a default file was just written in place of a usable one.
    pub newly_created: bool,
}

impl Config {
    /// Load the configuration from `path`, creating a default file if none
    /// exists or the existing one cannot be parsed.
    ///
    /// Missing keys in an existing file are backfilled with defaults and the
    /// completed document is saved back.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read or written.
    pub fn load_or_create(path: &Path) -> Result<LoadedConfig, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save(path)?;
            debug!(path = %path.display(), "Wrote default configuration");
            return Ok(LoadedConfig {
                config,
                path: path.to_path_buf(),
                newly_created: true,
            });
        }

        let raw = fs::read_to_string(path)?;
        match serde_json::from_str::<Config>(&raw) {
            Ok(config) => {
                // Persist backfilled defaults so the file carries the full schema.
                config.save(path)?;
                debug!(path = %path.display(), "Loaded configuration");
                Ok(LoadedConfig {
                    config,
                    path: path.to_path_buf(),
                    newly_created: false,
                })
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "Config file is not valid JSON, replacing with defaults"
                );
                let config = Config::default();
                config.save(path)?;
                Ok(LoadedConfig {
                    config,
                    path: path.to_path_buf(),
                    newly_created: true,
                })
            }
        }
    }

    /// Save this configuration to `path` as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate field values.
    ///
    /// Checks shape only (URL scheme, known log levels, a non-negative
    /// renewal threshold); whether the credentials are accepted is up to the
    /// order service.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                field: "api_url",
                reason: format!("{:?} is not an http(s) URL", self.api_url),
            });
        }
        if self.token.is_empty() {
            return Err(ConfigError::Invalid {
                field: "token",
                reason: "must not be empty".to_string(),
            });
        }
        if self.renew_before_days < 0 {
            return Err(ConfigError::Invalid {
                field: "renew_before_days",
                reason: format!("{} is negative", self.renew_before_days),
            });
        }
        for (field, value) in [
            ("log_settings.console_level", &self.log_settings.console_level),
            ("log_settings.file_level", &self.log_settings.file_level),
        ] {
            if !LOG_LEVELS.contains(&value.to_lowercase().as_str()) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("unknown level {value:?}, expected one of {LOG_LEVELS:?}"),
                });
            }
        }
        Ok(())
    }
}
