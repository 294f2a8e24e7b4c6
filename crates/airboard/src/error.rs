//! Error types for airboard.
//!
//! This module defines all error types used throughout the airboard crate.
//! Most of them never reach the user: the pipeline turns fetch and
//! normalization failures into the sample dataset, and the future-date
//! filter turns its own faults into a no-op.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for airboard operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Source Errors ===
    /// A single attempt to read the remote or local source failed.
    #[error("failed to read source '{source_name}': {message}")]
    Fetch {
        /// Name of the source (URL or file path).
        source_name: String,
        /// Description of what went wrong.
        message: String,
    },

    /// The HTTP client reported an error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // === Table Errors ===
    /// CSV parsing or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // === Normalization Errors ===
    /// No column looks like it holds the pollutant measurement.
    #[error("no pollutant value column found among {columns:?}")]
    ValueColumnNotFound {
        /// The column names that were searched.
        columns: Vec<String>,
    },

    /// No year column is named and the positional fallback does not exist.
    #[error("no year column found among {columns:?}")]
    YearColumnNotFound {
        /// The column names that were searched.
        columns: Vec<String>,
    },

    // === Filter Errors ===
    /// The future-date filter hit an internal fault.
    #[error("future-date filter failed: {message}")]
    DateFilter {
        /// Description of the fault.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// The reference timezone name is not a known IANA zone.
    #[error("unknown timezone '{name}'")]
    InvalidTimezone {
        /// The rejected timezone name.
        name: String,
    },

    // === Calculator Errors ===
    /// A calculator input is outside its domain.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the invalid input.
        message: String,
    },

    // === I/O Errors ===
    /// Failed to read a file.
    #[error("failed to read {path}: {source}")]
    FileRead {
        /// Path that couldn't be read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for airboard operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new fetch error.
    #[must_use]
    pub fn fetch(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a new configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Create a new invalid input error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new future-date filter error.
    #[must_use]
    pub fn date_filter(message: impl Into<String>) -> Self {
        Self::DateFilter {
            message: message.into(),
        }
    }

    /// Check if this error means the raw table could not be normalized.
    ///
    /// These are the errors the pipeline answers with the sample dataset.
    #[must_use]
    pub fn is_normalization_error(&self) -> bool {
        matches!(
            self,
            Self::ValueColumnNotFound { .. } | Self::YearColumnNotFound { .. }
        )
    }

    /// Check if this error came from reading the data source.
    #[must_use]
    pub fn is_source_error(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. } | Self::Http(_) | Self::FileRead { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::fetch("https://example.org/pm25.csv", "timed out");
        assert_eq!(
            err.to_string(),
            "failed to read source 'https://example.org/pm25.csv': timed out"
        );

        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");
    }

    #[test]
    fn test_value_column_not_found_display() {
        let err = Error::ValueColumnNotFound {
            columns: vec!["Entity".to_string(), "Year".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("Entity"));
        assert!(msg.contains("Year"));
    }

    #[test]
    fn test_is_normalization_error() {
        assert!(Error::ValueColumnNotFound { columns: vec![] }.is_normalization_error());
        assert!(Error::YearColumnNotFound { columns: vec![] }.is_normalization_error());
        assert!(!Error::internal("x").is_normalization_error());
    }

    #[test]
    fn test_is_source_error() {
        assert!(Error::fetch("file.csv", "missing").is_source_error());
        assert!(!Error::date_filter("bad row").is_source_error());
    }

    #[test]
    fn test_date_filter_display() {
        let err = Error::date_filter("no local midnight on 2018-11-04");
        assert_eq!(
            err.to_string(),
            "future-date filter failed: no local midnight on 2018-11-04"
        );
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::config_validation("ttl_secs must be greater than 0");
        assert!(err.to_string().contains("ttl_secs"));
    }

    #[test]
    fn test_invalid_timezone_display() {
        let err = Error::InvalidTimezone {
            name: "Mars/Olympus".to_string(),
        };
        assert!(err.to_string().contains("Mars/Olympus"));
    }

    #[test]
    fn test_invalid_input_display() {
        let err = Error::invalid_input("room size must be positive");
        assert_eq!(err.to_string(), "invalid input: room size must be positive");
    }

    #[test]
    fn test_file_read_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::FileRead {
            path: PathBuf::from("/data/pm25.csv"),
            source: io_err,
        };
        assert!(err.to_string().contains("/data/pm25.csv"));
        assert!(err.is_source_error());
    }
}
