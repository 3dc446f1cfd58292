//! Configuration loading utilities

use crate::schema::Config;
use blip_common::{InsightsError, LogFormat};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "BLIP_INSIGHTS_CONFIG";

/// Files tried, in order, when no path is given
pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["insights.yaml", "insights.yml"];

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file '{path}': {source}")]
    IoError {
        /// File that could not be read
        path: PathBuf,
        /// Underlying read error
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParseError {
        /// Variable name
        var: String,
        /// Parse failure
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A value failed validation
    #[error("Invalid configuration value for {field}: {message}")]
    Invalid {
        /// Offending key
        field: String,
        /// Why it was refused
        message: String,
    },
}

impl From<ConfigError> for InsightsError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Invalid { field, message } => Self::validation_field(message, field),
            other => Self::config_with_source("Could not load configuration", other),
        }
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file with environment variable overrides
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&content)?
        };
        info!(path = %path.display(), "Loaded configuration file");

        Self::apply_env_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `BLIP_INSIGHTS_CONFIG`, a default file in the
    /// working directory, or built-in defaults, with environment overrides.
    pub fn load() -> Result<Config, ConfigError> {
        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            return Self::load_config(config_path);
        }
        if let Some(found) = DEFAULT_CONFIG_FILES.iter().find(|f| Path::new(f).exists()) {
            return Self::load_config(found);
        }

        debug!("No configuration file found, using defaults");
        let mut config = Config::default();
        Self::apply_env_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path when given, otherwise as [`Self::load`]
    pub fn load_from(path: Option<&Path>) -> Result<Config, ConfigError> {
        match path {
            Some(path) => Self::load_config(path),
            None => Self::load(),
        }
    }

    /// Apply process environment overrides to configuration
    pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        Self::apply_overrides_from(config, |var| env::var(var).ok())
    }

    /// Apply overrides read through `lookup`; tests pass a map instead of the
    /// process environment.
    pub fn apply_overrides_from<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T>(var: &str, value: &str) -> Result<T, ConfigError>
        where
            T: std::str::FromStr,
            T::Err: std::error::Error + Send + Sync + 'static,
        {
            value.trim().parse().map_err(|e| ConfigError::EnvParseError {
                var: var.to_string(),
                source: Box::new(e),
            })
        }

        // API overrides
        if let Some(url) = lookup("BLIP_API_URL") {
            config.api.base_url = url;
        }
        if let Some(timeout) = lookup("BLIP_TIMEOUT") {
            config.api.timeout_secs = parsed("BLIP_TIMEOUT", &timeout)?;
        }
        if let Some(take) = lookup("BLIP_PAGE_SIZE") {
            config.api.page_size = parsed("BLIP_PAGE_SIZE", &take)?;
        }
        if let Some(max) = lookup("BLIP_MAX_EVENTS") {
            config.api.max_events = parsed("BLIP_MAX_EVENTS", &max)?;
        }

        // Analysis overrides
        if let Some(flow) = lookup("BLIP_FLOW") {
            config.analysis.flow = flow;
        }
        if let Some(days) = lookup("BLIP_DAYS") {
            config.analysis.days = parsed("BLIP_DAYS", &days)?;
        }
        if let Some(timezone) = lookup("BLIP_TIMEZONE") {
            config.analysis.timezone = timezone;
        }
        if let Some(start) = lookup("BLIP_BUSINESS_START") {
            config.analysis.business_start = start;
        }
        if let Some(end) = lookup("BLIP_BUSINESS_END") {
            config.analysis.business_end = end;
        }

        // Export overrides
        if let Some(dir) = lookup("BLIP_OUTPUT_DIR") {
            config.export.output_dir = PathBuf::from(dir);
        }
        if let Some(language) = lookup("BLIP_LANGUAGE") {
            config.export.language = language;
        }

        // Logging overrides
        if let Some(level) = lookup("BLIP_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = lookup("BLIP_LOG_FORMAT") {
            config.logging.format = match format.trim().to_ascii_lowercase().as_str() {
                "pretty" => LogFormat::Pretty,
                "compact" => LogFormat::Compact,
                "json" => LogFormat::Json,
                other => {
                    return Err(ConfigError::EnvParseError {
                        var: "BLIP_LOG_FORMAT".to_string(),
                        source: format!("unknown log format '{other}'").into(),
                    })
                }
            };
        }
        if let Some(file) = lookup("BLIP_LOG_FILE") {
            config.logging.file_path = Some(PathBuf::from(file));
        }

        Ok(())
    }
}
