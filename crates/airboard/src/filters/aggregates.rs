//! Supranational aggregate removal.
//!
//! Sources mix country rows with rows for groups of countries ("World",
//! continents, income bands). This filter drops the groups by exact name.

use tracing::debug;

use crate::normalize::CandidateRecord;
use crate::record::{NormalizedRecord, NormalizedTable};

/// Names of aggregate entities excluded by default.
#[must_use]
pub fn default_excluded_entities() -> Vec<&'static str> {
    vec![
        "World",
        // Income bands
        "High-income countries",
        "Upper-middle-income countries",
        "Lower-middle-income countries",
        "Low-income countries",
        // Continents
        "Europe",
        "Asia",
        "Africa",
        "North America",
        "South America",
        "Oceania",
    ]
}

/// Anything carrying a country name.
pub trait CountryRow {
    /// The country name of this row.
    fn country(&self) -> &str;
}

impl CountryRow for NormalizedRecord {
    fn country(&self) -> &str {
        &self.country
    }
}

impl CountryRow for CandidateRecord {
    fn country(&self) -> &str {
        &self.country
    }
}

/// Drops rows whose country is an aggregate entity.
#[derive(Debug, Clone)]
pub struct AggregateFilter {
    excluded: Vec<String>,
}

impl AggregateFilter {
    /// Create a filter with the default deny-list.
    #[must_use]
    pub fn new() -> Self {
        Self::with_entities(
            default_excluded_entities()
                .into_iter()
                .map(String::from)
                .collect(),
        )
    }

    /// Create a filter with a custom deny-list.
    #[must_use]
    pub fn with_entities(excluded: Vec<String>) -> Self {
        Self { excluded }
    }

    /// Check if `country` is on the deny-list. Case and spacing must match.
    #[must_use]
    pub fn is_aggregate(&self, country: &str) -> bool {
        self.excluded.iter().any(|e| e == country)
    }

    /// The deny-list.
    #[must_use]
    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    /// Add a name to the deny-list.
    pub fn exclude(&mut self, name: &str) {
        if !self.is_aggregate(name) {
            self.excluded.push(name.to_string());
        }
    }

    /// Remove a name from the deny-list.
    pub fn unexclude(&mut self, name: &str) {
        self.excluded.retain(|e| e != name);
    }

    /// Drop aggregate rows, keeping the rest in order.
    #[must_use]
    pub fn apply<T: CountryRow>(&self, mut rows: Vec<T>) -> Vec<T> {
        let before = rows.len();
        rows.retain(|row| !self.is_aggregate(row.country()));
        debug!(before, after = rows.len(), "Removed aggregate entities");
        rows
    }

    /// Drop aggregate rows from a normalized table.
    #[must_use]
    pub fn apply_table(&self, table: NormalizedTable) -> NormalizedTable {
        table.retain(|r| !self.is_aggregate(&r.country))
    }
}

impl Default for AggregateFilter {
    fn default() -> Self {
        Self::new()
    }
}
