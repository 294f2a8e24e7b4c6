//! Pollutant value-column detection.
//!
//! Sources name their measurement column freely ("PM2.5", "Average exposure
//! to PM2.5 (µg/m³)", "pm25_mean", ...). The detector holds two tiers of
//! [`ColumnPattern`]s: pollutant patterns, then generic value aliases. For
//! each tier it scans the columns in source order and returns the first
//! column matching any pattern of that tier.

use regex::Regex;
use tracing::{debug, warn};

/// A compiled column-name matcher.
#[derive(Debug, Clone)]
pub struct ColumnPattern {
    /// Name of the pattern for identification.
    pub name: &'static str,

    /// Description of what this pattern matches.
    pub description: &'static str,

    /// The compiled regex.
    regex: Regex,
}

impl ColumnPattern {
    /// Create a new column pattern.
    ///
    /// # Panics
    ///
    /// Panics if the regex pattern is invalid.
    #[must_use]
    pub fn new(name: &'static str, description: &'static str, pattern: &str) -> Self {
        Self {
            name,
            description,
            regex: Regex::new(pattern).expect("Invalid regex pattern"),
        }
    }

    /// Create a pattern from a user-supplied regex, matched case-insensitively.
    ///
    /// Returns `None` if the regex does not compile.
    #[must_use]
    pub fn custom(pattern: &str) -> Option<Self> {
        match compile_custom(pattern) {
            Ok(regex) => Some(Self {
                name: "custom",
                description: "Configured value-column pattern",
                regex,
            }),
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "Invalid value-column pattern");
                None
            }
        }
    }

    /// Check if a column name matches this pattern.
    #[must_use]
    pub fn matches(&self, column: &str) -> bool {
        self.regex.is_match(column)
    }
}

/// Compile a configured pattern the way [`ColumnPattern::custom`] matches it.
pub(crate) fn compile_custom(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("(?i){pattern}"))
}

/// Patterns naming the pollutant itself, matched anywhere in the column name.
#[must_use]
pub fn pollutant_patterns() -> Vec<ColumnPattern> {
    vec![
        ColumnPattern::new("pm2", "Contains 'pm2' (PM2.5, pm2_5, ...)", r"(?i)pm2"),
        ColumnPattern::new("pm_2", "Contains 'pm 2' (PM 2.5)", r"(?i)pm 2"),
        ColumnPattern::new("pm25", "Contains 'pm25'", r"(?i)pm25"),
        ColumnPattern::new(
            "average_exposure",
            "Contains 'average exposure'",
            r"(?i)average exposure",
        ),
    ]
}

/// Generic value-column aliases, matched against the whole column name.
#[must_use]
pub fn generic_value_patterns() -> Vec<ColumnPattern> {
    vec![
        ColumnPattern::new("value", "Column named 'value'", r"(?i)^value$"),
        ColumnPattern::new("avg", "Column named 'avg'", r"(?i)^avg$"),
        ColumnPattern::new("mean", "Column named 'mean'", r"(?i)^mean$"),
    ]
}

/// Finds the column holding the pollutant measurement.
#[derive(Debug, Clone)]
pub struct ColumnDetector {
    patterns: Vec<ColumnPattern>,
    aliases: Vec<ColumnPattern>,
}

impl ColumnDetector {
    /// Create a detector with the built-in patterns only.
    #[must_use]
    pub fn new() -> Self {
        Self::with_extra_patterns(&[])
    }

    /// Create a detector with extra regexes tried after the pollutant
    /// patterns and before the generic aliases.
    ///
    /// Invalid regexes are logged and skipped.
    #[must_use]
    pub fn with_extra_patterns(extra: &[String]) -> Self {
        let mut patterns = pollutant_patterns();
        patterns.extend(extra.iter().filter_map(|p| ColumnPattern::custom(p)));
        Self {
            patterns,
            aliases: generic_value_patterns(),
        }
    }

    /// The first-tier patterns (built-in pollutant patterns, then extras).
    #[must_use]
    pub fn patterns(&self) -> &[ColumnPattern] {
        &self.patterns
    }

    /// The second-tier generic value aliases.
    #[must_use]
    pub fn aliases(&self) -> &[ColumnPattern] {
        &self.aliases
    }

    /// Return the name of the value column, or `None` if nothing matches.
    #[must_use]
    pub fn detect<'a>(&self, columns: &'a [String]) -> Option<&'a str> {
        self.detect_index(columns).map(|i| columns[i].as_str())
    }

    /// Return the position of the value column, or `None` if nothing matches.
    #[must_use]
    pub fn detect_index(&self, columns: &[String]) -> Option<usize> {
        for tier in [&self.patterns, &self.aliases] {
            for (index, column) in columns.iter().enumerate() {
                if let Some(pattern) = tier.iter().find(|p| p.matches(column)) {
                    debug!(pattern = %pattern.name, column = %column, "Detected value column");
                    return Some(index);
                }
            }
        }
        None
    }
}

impl Default for ColumnDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_detects_owid_column() {
        let detector = ColumnDetector::new();
        let columns = cols(&["Entity", "Code", "Year", "Avg PM2.5 exposure"]);

        assert_eq!(detector.detect(&columns), Some("Avg PM2.5 exposure"));
    }

    #[test]
    fn test_detects_short_column_name() {
        let detector = ColumnDetector::new();
        let columns = cols(&["entity", "code", "year", "average_exposure_pm25"]);

        assert_eq!(detector.detect(&columns), Some("average_exposure_pm25"));
    }

    #[test]
    fn test_detects_spaced_variant() {
        let detector = ColumnDetector::new();
        let columns = cols(&["country", "year", "PM 2.5 mean"]);

        assert_eq!(detector.detect(&columns), Some("PM 2.5 mean"));
    }

    #[test]
    fn test_detects_average_exposure() {
        let detector = ColumnDetector::new();
        let columns = cols(&["country", "year", "Average exposure (µg/m³)"]);

        assert_eq!(detector.detect(&columns), Some("Average exposure (µg/m³)"));
    }

    #[test]
    fn test_first_column_wins() {
        let detector = ColumnDetector::new();
        let columns = cols(&["Entity", "PM2.5 lower", "PM2.5 upper"]);

        assert_eq!(detector.detect(&columns), Some("PM2.5 lower"));
    }

    #[test]
    fn test_column_order_beats_pattern_order() {
        let detector = ColumnDetector::new();
        let columns = cols(&["Entity", "Average exposure", "pm25"]);

        assert_eq!(detector.detect(&columns), Some("Average exposure"));
    }

    #[test]
    fn test_pollutant_pattern_beats_generic_alias() {
        let detector = ColumnDetector::new();
        let columns = cols(&["Entity", "Year", "value", "pm25"]);

        assert_eq!(detector.detect(&columns), Some("pm25"));
    }

    #[test]
    fn test_generic_alias_fallback() {
        let detector = ColumnDetector::new();

        assert_eq!(detector.detect(&cols(&["Entity", "Year", "VALUE"])), Some("VALUE"));
        assert_eq!(detector.detect(&cols(&["Entity", "Year", "Mean"])), Some("Mean"));
        assert_eq!(detector.detect(&cols(&["Entity", "Year", "avg"])), Some("avg"));
    }

    #[test]
    fn test_generic_alias_requires_whole_name() {
        let detector = ColumnDetector::new();
        let columns = cols(&["Entity", "Year", "mean_temperature"]);

        assert_eq!(detector.detect(&columns), None);
    }

    #[test]
    fn test_no_match() {
        let detector = ColumnDetector::new();
        let columns = cols(&["Entity", "Code", "Year", "Population"]);

        assert_eq!(detector.detect(&columns), None);
        assert_eq!(detector.detect_index(&columns), None);
    }

    #[test]
    fn test_extra_patterns() {
        let detector = ColumnDetector::with_extra_patterns(&["particulate".to_string()]);
        let columns = cols(&["Entity", "Year", "Fine Particulate Matter", "value"]);

        assert_eq!(detector.detect(&columns), Some("Fine Particulate Matter"));
    }

    #[test]
    fn test_invalid_extra_pattern_skipped() {
        let detector = ColumnDetector::with_extra_patterns(&["[invalid".to_string()]);
        assert_eq!(detector.patterns().len(), pollutant_patterns().len());
        assert_eq!(detector.aliases().len(), generic_value_patterns().len());
    }

    #[test]
    fn test_builtin_patterns_have_names() {
        for pattern in pollutant_patterns().iter().chain(&generic_value_patterns()) {
            assert!(!pattern.name.is_empty());
            assert!(!pattern.description.is_empty());
        }
    }
}
