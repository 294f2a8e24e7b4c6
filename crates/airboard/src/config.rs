//! Configuration management for airboard.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::calculators::CalculatorSettings;
use crate::countries::DEFAULT_FUZZY_THRESHOLD;
use crate::error::{Error, Result};
use crate::fetch::{RetryPolicy, DEFAULT_SOURCE_URL};
use crate::filters::default_excluded_entities;
use crate::normalize::compile_custom;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name.
const APP_DIR_NAME: &str = "airboard";

/// Prefix of environment variables that override the config file.
const ENV_PREFIX: &str = "AIRBOARD_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `AIRBOARD_`, nested keys joined by `__`)
/// 2. TOML config file at `~/.config/airboard/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data source configuration.
    pub source: SourceConfig,
    /// Dataset cache configuration.
    pub cache: CacheConfig,
    /// Normalization pipeline configuration.
    pub pipeline: PipelineConfig,
    /// Calculator coefficients.
    pub calculators: CalculatorSettings,
}

/// Where the dataset comes from and how hard to try.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// URL of the CSV dataset.
    pub url: String,
    /// Local copy of the dataset, read instead of the URL when set.
    pub local_path: Option<PathBuf>,
    /// Per-attempt timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Wait after the first failed attempt, in milliseconds.
    pub retry_base_delay_ms: u64,
    /// Extra wait for each further failed attempt, in milliseconds.
    pub retry_step_delay_ms: u64,
}

/// Dataset cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a loaded dataset stays fresh, in seconds.
    pub ttl_secs: u64,
}

/// Normalization pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// IANA timezone in which "today" is observed.
    pub timezone: String,
    /// Extra value-column regexes, matched case-insensitively.
    pub extra_value_patterns: Vec<String>,
    /// Minimum similarity for fuzzy country-name matches, in (0, 1].
    pub fuzzy_threshold: f64,
    /// Aggregate entity names to drop.
    pub excluded_entities: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            local_path: None,
            timeout_secs: 10,
            max_retries: 2,
            retry_base_delay_ms: 1000,
            retry_step_delay_ms: 2000,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 3600 }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timezone: "Asia/Seoul".to_string(),
            extra_value_patterns: Vec::new(),
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            excluded_entities: default_excluded_entities()
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl PipelineConfig {
    /// Parse the reference timezone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTimezone`] if the name is not an IANA zone.
    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| Error::InvalidTimezone {
                name: self.timezone.clone(),
            })
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `AIRBOARD_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        // Source
        if self.source.local_path.is_none() && self.source.url.trim().is_empty() {
            return Err(Error::config_validation(
                "source.url cannot be empty when source.local_path is not set",
            ));
        }

        if self.source.timeout_secs == 0 {
            return Err(Error::config_validation(
                "source.timeout_secs must be greater than 0",
            ));
        }

        // Cache
        if self.cache.ttl_secs == 0 {
            return Err(Error::config_validation(
                "cache.ttl_secs must be greater than 0",
            ));
        }

        // Pipeline
        self.pipeline.timezone()?;

        for pattern in &self.pipeline.extra_value_patterns {
            if let Err(e) = compile_custom(pattern) {
                return Err(Error::config_validation(format!(
                    "invalid regex pattern {pattern}: {e}"
                )));
            }
        }

        let threshold = self.pipeline.fuzzy_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(Error::config_validation(format!(
                "pipeline.fuzzy_threshold must be in (0, 1], got {threshold}"
            )));
        }

        self.calculators.validate()
    }

    /// Get the fetch retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.source.max_retries,
            timeout: Duration::from_secs(self.source.timeout_secs),
            base_delay: Duration::from_millis(self.source.retry_base_delay_ms),
            step_delay: Duration::from_millis(self.source.retry_step_delay_ms),
        }
    }

    /// Get the cache TTL as a Duration.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "airboard-config-{name}-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.source.url, DEFAULT_SOURCE_URL);
        assert!(config.source.local_path.is_none());
        assert_eq!(config.cache.ttl_secs, 3600);
        assert_eq!(config.pipeline.timezone, "Asia/Seoul");
        assert!(config.pipeline.extra_value_patterns.is_empty());
    }

    #[test]
    fn test_default_source_config() {
        let source = SourceConfig::default();

        assert_eq!(source.timeout_secs, 10);
        assert_eq!(source.max_retries, 2);
        assert_eq!(source.retry_base_delay_ms, 1000);
        assert_eq!(source.retry_step_delay_ms, 2000);
    }

    #[test]
    fn test_default_pipeline_config() {
        let pipeline = PipelineConfig::default();

        assert!((pipeline.fuzzy_threshold - 0.85).abs() < f64::EPSILON);
        assert!(pipeline.excluded_entities.contains(&"World".to_string()));
        assert_eq!(pipeline.timezone().unwrap(), chrono_tz::Asia::Seoul);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.source.timeout_secs = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("timeout_secs"));
    }

    #[test]
    fn test_validate_empty_url() {
        let mut config = Config::default();
        config.source.url = String::new();
        assert!(config.validate().is_err());

        config.source.local_path = Some(PathBuf::from("/data/pm25.csv"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_ttl() {
        let mut config = Config::default();
        config.cache.ttl_secs = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("ttl_secs"));
    }

    #[test]
    fn test_validate_invalid_timezone() {
        let mut config = Config::default();
        config.pipeline.timezone = "Mars/Olympus_Mons".to_string();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidTimezone { .. }));
    }

    #[test]
    fn test_validate_invalid_regex() {
        let mut config = Config::default();
        config.pipeline.extra_value_patterns = vec!["[invalid".to_string()];

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("invalid regex"));
    }

    #[test]
    fn test_validated_patterns_match_case_insensitively() {
        let mut config = Config::default();
        config.pipeline.extra_value_patterns = vec![r"^concentration$".to_string()];
        config.validate().unwrap();

        let pattern = crate::normalize::ColumnPattern::custom(r"^concentration$").unwrap();
        assert!(pattern.matches("CONCENTRATION"));
    }

    #[test]
    fn test_validate_rejects_what_detector_rejects() {
        for pattern in ["[invalid", "(?", "x{2,1}"] {
            let mut config = Config::default();
            config.pipeline.extra_value_patterns = vec![pattern.to_string()];

            assert!(config.validate().is_err(), "accepted {pattern}");
            assert!(crate::normalize::ColumnPattern::custom(pattern).is_none());
        }
    }

    #[test]
    fn test_validate_fuzzy_threshold() {
        let mut config = Config::default();
        config.pipeline.fuzzy_threshold = 0.0;
        assert!(config.validate().is_err());

        config.pipeline.fuzzy_threshold = 1.0;
        assert!(config.validate().is_ok());

        config.pipeline.fuzzy_threshold = 1.2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_calculator_settings() {
        let mut config = Config::default();
        config.calculators.plants.co2_multiplier = 5.0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("plants.co2_multiplier"));
    }

    #[test]
    fn test_retry_policy() {
        let policy = Config::default().retry_policy();

        assert_eq!(policy, RetryPolicy::default());
        assert_eq!(policy.attempts(), 3);
    }

    #[test]
    fn test_cache_ttl() {
        assert_eq!(Config::default().cache_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.ends_with("airboard/config.toml"));
    }

    #[test]
    fn test_load_from_toml() {
        let path = temp_config(
            "load",
            r#"
[source]
local_path = "/data/pm25.csv"
max_retries = 0

[pipeline]
timezone = "Europe/Berlin"
extra_value_patterns = ["particulate"]

[calculators.risk]
low_boundary = 1.0
"#,
        );

        let config = Config::load_from(Some(path.clone())).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.source.local_path, Some(PathBuf::from("/data/pm25.csv")));
        assert_eq!(config.source.max_retries, 0);
        assert_eq!(config.source.timeout_secs, 10);
        assert_eq!(config.pipeline.timezone().unwrap(), chrono_tz::Europe::Berlin);
        assert_eq!(config.pipeline.extra_value_patterns, vec!["particulate"]);
        assert!((config.calculators.risk.low_boundary - 1.0).abs() < f64::EPSILON);
        assert!((config.calculators.risk.medium_boundary - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("airboard-config-does-not-exist.toml");
        let config = Config::load_from(Some(path)).unwrap();

        assert_eq!(config.cache.ttl_secs, 3600);
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let path = temp_config("invalid", "[cache]\nttl_secs = 0\n");
        let result = Config::load_from(Some(path.clone()));
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }
}
