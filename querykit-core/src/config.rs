//! Runtime configuration for pagination defaults, validator limits and logging.
//!
//! Resolution order (lowest to highest priority):
//! 1. built-in defaults
//! 2. a YAML file (`querykit.yaml` by convention)
//! 3. `.env` file (loaded into the process environment, never overwriting)
//! 4. `QUERYKIT_*` environment variables
//!
//! ```yaml
//! pagination:
//!   default_limit: 50
//!   max_limit: 500
//! validation:
//!   max_depth: 32
//! logging:
//!   level: debug
//!   format: json
//! ```

use std::path::Path;
use std::str::FromStr;

use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::pagination::{PaginationPolicy, DEFAULT_LIMIT};
use crate::validation::{ValidatorOptions, DEFAULT_MAX_DEPTH, MAX_STRING_LENGTH};

/// A single validation error detail from typed config validation.
#[derive(Debug, Clone)]
pub struct ConfigValidationDetail {
    pub key: String,
    pub message: String,
}

/// Error type for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// An I/O or YAML parsing error occurred while loading the config file.
    Load(String),
    /// An environment override could not be parsed.
    TypeMismatch { key: String, expected: &'static str },
    /// Constraint violations in the resolved config.
    Validation(Vec<ConfigValidationDetail>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
            ConfigError::TypeMismatch { key, expected } => {
                write!(f, "Config type mismatch for '{key}': expected {expected}")
            }
            ConfigError::Validation(details) => {
                write!(f, "Config validation errors:")?;
                for detail in details {
                    write!(f, "\n  - {}: {}", detail.key, detail.message)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PaginationConfig {
    #[garde(range(min = 1))]
    pub default_limit: u64,
    #[garde(skip)]
    pub max_limit: Option<u64>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ValidationConfig {
    #[garde(range(min = 1))]
    pub max_string_length: usize,
    #[garde(skip)]
    pub max_depth: Option<usize>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_string_length: MAX_STRING_LENGTH,
            max_depth: Some(DEFAULT_MAX_DEPTH),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    #[garde(length(min = 1))]
    pub level: String,
    #[garde(skip)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct QueryKitConfig {
    #[garde(dive)]
    pub pagination: PaginationConfig,
    #[garde(dive)]
    pub validation: ValidationConfig,
    #[garde(dive)]
    pub logging: LoggingConfig,
}

impl QueryKitConfig {
    /// Load from a YAML file (skipped if missing), `.env`, then environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::Load(e.to_string()))?;
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Load(e.to_string()))?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            QueryKitConfig::default()
        };

        // Does NOT overwrite existing env vars.
        let _ = dotenvy::dotenv();

        config.apply_env()?;
        config.check()?;
        Ok(config)
    }

    /// Parse a YAML string (useful for testing). No environment overlay.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: QueryKitConfig =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Load(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Overlay `QUERYKIT_*` environment variables.
    ///
    /// `none` (or an empty value) clears the optional caps.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(v) = env_value("QUERYKIT_PAGINATION_DEFAULT_LIMIT") {
            self.pagination.default_limit = parse_env("QUERYKIT_PAGINATION_DEFAULT_LIMIT", &v, "u64")?;
        }
        if let Some(v) = env_value("QUERYKIT_PAGINATION_MAX_LIMIT") {
            self.pagination.max_limit = parse_optional_env("QUERYKIT_PAGINATION_MAX_LIMIT", &v, "u64")?;
        }
        if let Some(v) = env_value("QUERYKIT_VALIDATION_MAX_STRING_LENGTH") {
            self.validation.max_string_length =
                parse_env("QUERYKIT_VALIDATION_MAX_STRING_LENGTH", &v, "usize")?;
        }
        if let Some(v) = env_value("QUERYKIT_VALIDATION_MAX_DEPTH") {
            self.validation.max_depth = parse_optional_env("QUERYKIT_VALIDATION_MAX_DEPTH", &v, "usize")?;
        }
        if let Some(v) = env_value("QUERYKIT_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = env_value("QUERYKIT_LOG_FORMAT") {
            self.logging.format = v.parse().map_err(|_| ConfigError::TypeMismatch {
                key: "QUERYKIT_LOG_FORMAT".to_string(),
                expected: "pretty|json",
            })?;
        }
        Ok(())
    }

    /// Run the garde constraints plus the cross-field checks.
    pub fn check(&self) -> Result<(), ConfigError> {
        let mut details = Vec::new();
        if let Err(report) = self.validate() {
            for (path, error) in report.iter() {
                details.push(ConfigValidationDetail {
                    key: path.to_string(),
                    message: error.message().to_string(),
                });
            }
        }
        if let Some(max) = self.pagination.max_limit {
            if max < self.pagination.default_limit {
                details.push(ConfigValidationDetail {
                    key: "pagination.max_limit".to_string(),
                    message: format!(
                        "must be at least default_limit ({})",
                        self.pagination.default_limit
                    ),
                });
            }
        }
        if details.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(details))
        }
    }

    pub fn pagination_policy(&self) -> PaginationPolicy {
        PaginationPolicy {
            default_limit: self.pagination.default_limit,
            max_limit: self.pagination.max_limit,
        }
    }

    pub fn validator_options(&self) -> ValidatorOptions {
        ValidatorOptions {
            max_string_length: self.validation.max_string_length,
            max_depth: self.validation.max_depth,
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string())
}

fn parse_env<T: FromStr>(key: &str, value: &str, expected: &'static str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::TypeMismatch {
        key: key.to_string(),
        expected,
    })
}

fn parse_optional_env<T: FromStr>(
    key: &str,
    value: &str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    parse_env(key, value, expected).map(Some)
}
