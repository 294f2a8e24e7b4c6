//! Embedded ISO 3166-1 registry and the two registry-backed resolution tiers.

use std::collections::HashMap;
use std::sync::Arc;

use strsim::normalized_levenshtein;
use tracing::trace;

use super::iso3166::COUNTRIES;
use super::ResolutionTier;

/// Default minimum similarity for a fuzzy name match.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.85;

/// One ISO 3166-1 entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
    /// Two-letter code.
    pub alpha2: &'static str,

    /// Three-letter code.
    pub alpha3: &'static str,

    /// Three-digit numeric code, zero-padded.
    pub numeric: &'static str,

    /// Short name as listed by ISO.
    pub name: &'static str,

    /// Official long-form name, if ISO lists one.
    pub official_name: Option<&'static str>,

    /// Everyday name, if it differs from the listed short name.
    pub common_name: Option<&'static str>,
}

impl Country {
    pub(super) const fn new(
        alpha2: &'static str,
        alpha3: &'static str,
        numeric: &'static str,
        name: &'static str,
        official_name: Option<&'static str>,
        common_name: Option<&'static str>,
    ) -> Self {
        Self {
            alpha2,
            alpha3,
            numeric,
            name,
            official_name,
            common_name,
        }
    }

    /// All names of this entry: short, official, common.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        [Some(self.name), self.official_name, self.common_name]
            .into_iter()
            .flatten()
    }

    fn has_code(&self, query: &str) -> bool {
        self.alpha2.eq_ignore_ascii_case(query)
            || self.alpha3.eq_ignore_ascii_case(query)
            || self.numeric == query
    }

    fn has_name_ignore_case(&self, lowered: &str) -> bool {
        self.names().any(|n| n.to_lowercase() == lowered)
    }
}

/// The full ISO 3166-1 country list with name indexes.
#[derive(Debug, Clone)]
pub struct CountryRegistry {
    countries: &'static [Country],
    by_name: HashMap<&'static str, &'static str>,
}

impl CountryRegistry {
    /// Build the registry from the embedded ISO 3166-1 table.
    #[must_use]
    pub fn iso3166() -> Self {
        let mut by_name = HashMap::with_capacity(COUNTRIES.len() * 2);
        for country in COUNTRIES {
            by_name.entry(country.name).or_insert(country.alpha3);
            if let Some(official) = country.official_name {
                by_name.entry(official).or_insert(country.alpha3);
            }
        }
        Self {
            countries: COUNTRIES,
            by_name,
        }
    }

    /// All entries in registry order.
    #[must_use]
    pub fn countries(&self) -> &'static [Country] {
        self.countries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.countries.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    /// Find the entry with this alpha-3 code.
    #[must_use]
    pub fn get(&self, alpha3: &str) -> Option<&'static Country> {
        self.countries.iter().find(|c| c.alpha3 == alpha3)
    }

    /// Verbatim match against short and official names.
    #[must_use]
    pub fn exact(&self, name: &str) -> Option<&'static str> {
        self.by_name.get(name).copied()
    }

    /// Case-insensitive match against codes and every name.
    #[must_use]
    pub fn lookup(&self, query: &str) -> Option<&'static str> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        if let Some(country) = self.countries.iter().find(|c| c.has_code(query)) {
            return Some(country.alpha3);
        }
        let lowered = query.to_lowercase();
        self.countries
            .iter()
            .find(|c| c.has_name_ignore_case(&lowered))
            .map(|c| c.alpha3)
    }

    /// Best name similarity at or above `threshold`.
    ///
    /// Ties go to the earliest registry entry.
    #[must_use]
    pub fn fuzzy(&self, query: &str, threshold: f64) -> Option<&'static str> {
        let lowered = query.trim().to_lowercase();
        if lowered.is_empty() {
            return None;
        }

        let mut best: Option<(&'static Country, f64)> = None;
        for country in self.countries {
            let score = country
                .names()
                .map(|n| normalized_levenshtein(&lowered, &n.to_lowercase()))
                .fold(0.0_f64, f64::max);
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((country, score));
            }
        }

        let (country, score) = best?;
        trace!(query = %query, candidate = %country.alpha3, score, "Fuzzy registry match");
        (score >= threshold).then_some(country.alpha3)
    }
}

impl Default for CountryRegistry {
    fn default() -> Self {
        Self::iso3166()
    }
}

/// Second tier: exact registry name or official name.
#[derive(Debug, Clone)]
pub struct RegistryExact {
    registry: Arc<CountryRegistry>,
}

impl RegistryExact {
    /// Create the tier over a shared registry.
    #[must_use]
    pub fn new(registry: Arc<CountryRegistry>) -> Self {
        Self { registry }
    }
}

impl ResolutionTier for RegistryExact {
    fn name(&self) -> &'static str {
        "registry"
    }

    fn resolve(&self, country: &str) -> Option<&'static str> {
        self.registry.exact(country)
    }
}

/// Third tier: alias lookup, then the closest registry name.
#[derive(Debug, Clone)]
pub struct RegistryFuzzy {
    registry: Arc<CountryRegistry>,
    threshold: f64,
}

impl RegistryFuzzy {
    /// Create the tier over a shared registry with a similarity threshold.
    #[must_use]
    pub fn new(registry: Arc<CountryRegistry>, threshold: f64) -> Self {
        Self {
            registry,
            threshold,
        }
    }

    /// Minimum similarity for a match.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl ResolutionTier for RegistryFuzzy {
    fn name(&self) -> &'static str {
        "fuzzy"
    }

    fn resolve(&self, country: &str) -> Option<&'static str> {
        self.registry
            .lookup(country)
            .or_else(|| self.registry.fuzzy(country, self.threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::is_iso_alpha3;

    #[test]
    fn test_registry_is_well_formed() {
        let registry = CountryRegistry::iso3166();

        assert_eq!(registry.len(), 249);
        for country in registry.countries() {
            assert!(is_iso_alpha3(country.alpha3), "{}", country.alpha3);
            assert_eq!(country.alpha2.len(), 2);
            assert_eq!(country.numeric.len(), 3);
            assert!(!country.name.is_empty());
        }
    }

    #[test]
    fn test_alpha3_codes_are_unique() {
        let registry = CountryRegistry::iso3166();
        let mut codes: Vec<_> = registry.countries().iter().map(|c| c.alpha3).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), registry.len());
    }

    #[test]
    fn test_exact_name_and_official_name() {
        let registry = CountryRegistry::iso3166();

        assert_eq!(registry.exact("Peru"), Some("PER"));
        assert_eq!(registry.exact("Republic of Peru"), Some("PER"));
        assert_eq!(registry.exact("Korea, Republic of"), Some("KOR"));
        assert_eq!(registry.exact("peru"), None);
        assert_eq!(registry.exact("South Korea"), None);
    }

    #[test]
    fn test_lookup_codes_and_aliases() {
        let registry = CountryRegistry::iso3166();

        assert_eq!(registry.lookup("de"), Some("DEU"));
        assert_eq!(registry.lookup("fra"), Some("FRA"));
        assert_eq!(registry.lookup("392"), Some("JPN"));
        assert_eq!(registry.lookup("south korea"), Some("KOR"));
        assert_eq!(registry.lookup("Vietnam"), Some("VNM"));
        assert_eq!(registry.lookup("  Syria "), Some("SYR"));
        assert_eq!(registry.lookup(""), None);
        assert_eq!(registry.lookup("Narnia"), None);
    }

    #[test]
    fn test_fuzzy_misspelling() {
        let registry = CountryRegistry::iso3166();

        assert_eq!(registry.fuzzy("Sweeden", DEFAULT_FUZZY_THRESHOLD), Some("SWE"));
        assert_eq!(registry.fuzzy("Narnia", DEFAULT_FUZZY_THRESHOLD), None);
        assert_eq!(registry.fuzzy("", DEFAULT_FUZZY_THRESHOLD), None);
    }

    #[test]
    fn test_fuzzy_threshold_bounds_matches() {
        let registry = CountryRegistry::iso3166();

        assert_eq!(registry.fuzzy("Sweeden", 0.99), None);
        assert_eq!(registry.fuzzy("Sweeden", 0.5), Some("SWE"));
    }

    #[test]
    fn test_fuzzy_is_deterministic() {
        let registry = CountryRegistry::iso3166();
        let first = registry.fuzzy("Bolivya", 0.5);
        for _ in 0..5 {
            assert_eq!(registry.fuzzy("Bolivya", 0.5), first);
        }
    }

    #[test]
    fn test_tiers() {
        let registry = Arc::new(CountryRegistry::iso3166());
        let exact = RegistryExact::new(Arc::clone(&registry));
        let fuzzy = RegistryFuzzy::new(registry, DEFAULT_FUZZY_THRESHOLD);

        assert_eq!(exact.resolve("Czechia"), Some("CZE"));
        assert_eq!(exact.resolve("Laos"), None);
        assert_eq!(fuzzy.resolve("Laos"), Some("LAO"));
        assert_eq!(exact.name(), "registry");
        assert_eq!(fuzzy.name(), "fuzzy");
    }

    #[test]
    fn test_get() {
        let registry = CountryRegistry::iso3166();
        let korea = registry.get("KOR").unwrap();

        assert_eq!(korea.alpha2, "KR");
        assert_eq!(korea.common_name, Some("South Korea"));
        assert!(registry.get("XXX").is_none());
    }
}
