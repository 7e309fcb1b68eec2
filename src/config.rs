//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::tagger::DEFAULT_RELOAD_INTERVAL_SECS;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tagger: TaggerConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Tagging engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TaggerConfig {
    /// Path to the SQLite mapping database
    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default = "default_reload_interval")]
    pub reload_interval_secs: u64,

    #[serde(default)]
    pub tables: TableConfig,
}

fn default_database() -> String {
    dirs::data_local_dir()
        .map(|p| {
            p.join("friendly-tagger")
                .join("mappings.db")
                .to_string_lossy()
                .to_string()
        })
        .unwrap_or_else(|| "./mappings.db".to_string())
}

fn default_reload_interval() -> u64 {
    DEFAULT_RELOAD_INTERVAL_SECS
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            reload_interval_secs: default_reload_interval(),
            tables: TableConfig::default(),
        }
    }
}

/// Mapping table per attribute
#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    #[serde(default = "default_country_table")]
    pub country: String,

    #[serde(default = "default_region_table")]
    pub region: String,

    #[serde(default = "default_county_table")]
    pub county: String,

    #[serde(default = "default_asn_table")]
    pub asn: String,
}

fn default_country_table() -> String {
    "country_mappings".to_string()
}

fn default_region_table() -> String {
    "region_mappings".to_string()
}

fn default_county_table() -> String {
    "county_mappings".to_string()
}

fn default_asn_table() -> String {
    "asn_mappings".to_string()
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            country: default_country_table(),
            region: default_region_table(),
            county: default_county_table(),
            asn: default_asn_table(),
        }
    }
}

/// ASN ingestion configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.data.caida.org/as2org/dev/asns/".to_string()
}

fn default_user_agent() -> String {
    "friendly-tagger".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths: Vec<PathBuf> = [
            dirs::config_dir().map(|p| p.join("friendly-tagger").join("config.toml")),
            Some(PathBuf::from("/etc/friendly-tagger/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self::load_first(&config_paths)
    }

    /// First of `paths` that exists and parses, else defaults plus environment
    ///
    /// Files that exist but fail to load are logged and skipped.
    pub fn load_first(paths: &[PathBuf]) -> Self {
        for path_opt in paths {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(database) = std::env::var("FRIENDLY_TAGGER_DATABASE") {
            self.tagger.database = database;
        }
        if let Ok(interval) = std::env::var("FRIENDLY_TAGGER_RELOAD_INTERVAL") {
            if let Ok(secs) = interval.parse() {
                self.tagger.reload_interval_secs = secs;
            }
        }

        if let Ok(url) = std::env::var("FRIENDLY_TAGGER_API_URL") {
            self.ingest.api_url = url;
        }

        if let Ok(level) = std::env::var("FRIENDLY_TAGGER_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("FRIENDLY_TAGGER_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# friendly-tagger configuration
#
# Environment variables override these settings:
# - FRIENDLY_TAGGER_DATABASE
# - FRIENDLY_TAGGER_RELOAD_INTERVAL
# - FRIENDLY_TAGGER_API_URL
# - FRIENDLY_TAGGER_LOG_LEVEL
# - FRIENDLY_TAGGER_LOG_FORMAT

[tagger]
# SQLite database holding the code -> label mapping tables
database = "mappings.db"

# Seconds between reloads of the mapping tables, measured against
# record timestamps
reload_interval_secs = 120

[tagger.tables]
country = "country_mappings"
region = "region_mappings"
county = "county_mappings"
asn = "asn_mappings"

[ingest]
# Paginated AS-to-organisation API
api_url = "https://api.data.caida.org/as2org/dev/asns/"
user_agent = "friendly-tagger"

# Per-request timeout in seconds
timeout_secs = 10

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
