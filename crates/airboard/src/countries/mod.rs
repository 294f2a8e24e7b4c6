//! Country code resolution.
//!
//! Fills missing ISO 3166-1 alpha-3 codes with a fixed chain of tiers, each
//! applied only to the rows still unresolved after the previous one:
//!
//! 1. [`StaticTable`]: curated everyday names ("Korea", "Russia", ...).
//! 2. [`RegistryExact`]: ISO short or official name, verbatim.
//! 3. [`RegistryFuzzy`]: codes and names ignoring case, then the closest name.
//!
//! Earlier tiers always win. Rows still unresolved at the end are dropped.
//!
//! # Example
//!
//! ```
//! use airboard::countries::CountryResolver;
//!
//! let resolver = CountryResolver::new(0.85);
//! assert_eq!(resolver.resolve_name("Korea"), Some(("static", "KOR")));
//! assert_eq!(resolver.resolve_name("Narnia"), None);
//! ```

mod common;
mod iso3166;
mod registry;

pub use common::StaticTable;
pub use registry::{
    Country, CountryRegistry, RegistryExact, RegistryFuzzy, DEFAULT_FUZZY_THRESHOLD,
};

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::debug;

use crate::normalize::CandidateRecord;
use crate::record::NormalizedRecord;

/// Tier name reported for codes supplied by the source itself.
pub const SOURCE_TIER: &str = "source";

/// One step of the resolution chain.
pub trait ResolutionTier: Send + Sync {
    /// Short name for reports and logs.
    fn name(&self) -> &'static str;

    /// The alpha-3 code for `country`, or `None` to defer to the next tier.
    fn resolve(&self, country: &str) -> Option<&'static str>;
}

/// Outcome of resolving a batch of candidates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Resolved records in input order.
    pub records: Vec<NormalizedRecord>,

    /// Candidates no tier could resolve.
    pub dropped: Vec<CandidateRecord>,

    /// Rows resolved per tier, in chain order, starting with [`SOURCE_TIER`].
    pub by_tier: Vec<(&'static str, usize)>,
}

impl Resolution {
    /// Rows resolved by the named tier.
    #[must_use]
    pub fn resolved_by(&self, tier: &str) -> usize {
        self.by_tier
            .iter()
            .find(|(name, _)| *name == tier)
            .map_or(0, |(_, count)| *count)
    }

    /// Distinct country names that were dropped, sorted.
    #[must_use]
    pub fn dropped_countries(&self) -> Vec<&str> {
        self.dropped
            .iter()
            .map(|c| c.country.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Runs the resolution tiers over candidate records.
pub struct CountryResolver {
    tiers: Vec<Box<dyn ResolutionTier>>,
}

impl CountryResolver {
    /// The standard chain: static table, registry exact, registry fuzzy.
    #[must_use]
    pub fn new(fuzzy_threshold: f64) -> Self {
        let registry = Arc::new(CountryRegistry::iso3166());
        Self::with_tiers(vec![
            Box::new(StaticTable::new()),
            Box::new(RegistryExact::new(Arc::clone(&registry))),
            Box::new(RegistryFuzzy::new(registry, fuzzy_threshold)),
        ])
    }

    /// A custom chain, tried in the given order.
    #[must_use]
    pub fn with_tiers(tiers: Vec<Box<dyn ResolutionTier>>) -> Self {
        Self { tiers }
    }

    /// Names of the tiers in chain order.
    #[must_use]
    pub fn tier_names(&self) -> Vec<&'static str> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    /// Resolve a single name, returning the tier that matched and the code.
    #[must_use]
    pub fn resolve_name(&self, country: &str) -> Option<(&'static str, &'static str)> {
        self.tiers
            .iter()
            .find_map(|tier| tier.resolve(country).map(|code| (tier.name(), code)))
    }

    /// Resolve every candidate lacking a code and drop the ones left over.
    #[must_use]
    pub fn resolve(&self, candidates: Vec<CandidateRecord>) -> Resolution {
        let mut resolved: Vec<(usize, NormalizedRecord)> = Vec::with_capacity(candidates.len());
        let mut pending = Vec::new();
        for candidate in candidates {
            match candidate.iso_alpha.clone() {
                Some(code) => resolved.push((candidate.row, into_record(candidate, code))),
                None => pending.push(candidate),
            }
        }
        let mut by_tier = vec![(SOURCE_TIER, resolved.len())];

        for tier in &self.tiers {
            if pending.is_empty() {
                by_tier.push((tier.name(), 0));
                continue;
            }
            let (matched, rest) = apply_tier(tier.as_ref(), pending);
            by_tier.push((tier.name(), matched.len()));
            resolved.extend(matched);
            pending = rest;
        }

        resolved.sort_by_key(|(row, _)| *row);
        let resolution = Resolution {
            records: resolved.into_iter().map(|(_, record)| record).collect(),
            dropped: pending,
            by_tier,
        };

        debug!(
            resolved = resolution.records.len(),
            dropped = resolution.dropped.len(),
            "Resolved country codes"
        );
        resolution
    }
}

impl std::fmt::Debug for CountryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountryResolver")
            .field("tiers", &self.tier_names())
            .finish()
    }
}

impl Default for CountryResolver {
    fn default() -> Self {
        Self::new(DEFAULT_FUZZY_THRESHOLD)
    }
}

type Matched = Vec<(usize, NormalizedRecord)>;

/// Run one tier over the pending subset; each distinct name is resolved once.
fn apply_tier(
    tier: &dyn ResolutionTier,
    pending: Vec<CandidateRecord>,
) -> (Matched, Vec<CandidateRecord>) {
    let names: BTreeSet<&str> = pending.iter().map(|c| c.country.as_str()).collect();
    let codes: HashMap<String, &'static str> = names
        .into_iter()
        .filter_map(|name| tier.resolve(name).map(|code| (name.to_string(), code)))
        .collect();

    let mut matched = Vec::new();
    let mut rest = Vec::new();
    for candidate in pending {
        match codes.get(&candidate.country) {
            Some(code) => matched.push((candidate.row, into_record(candidate, (*code).to_string()))),
            None => rest.push(candidate),
        }
    }
    (matched, rest)
}

fn into_record(candidate: CandidateRecord, iso_alpha: String) -> NormalizedRecord {
    NormalizedRecord {
        country: candidate.country,
        iso_alpha,
        year: candidate.year,
        value: candidate.value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::is_iso_alpha3;

    fn candidate(row: usize, country: &str, code: Option<&str>) -> CandidateRecord {
        CandidateRecord {
            row,
            country: country.to_string(),
            iso_alpha: code.map(String::from),
            year: 2022,
            value: 10.0,
        }
    }

    struct Everything;

    impl ResolutionTier for Everything {
        fn name(&self) -> &'static str {
            "everything"
        }

        fn resolve(&self, _country: &str) -> Option<&'static str> {
            Some("ZZZ")
        }
    }

    #[test]
    fn test_default_chain_order() {
        let resolver = CountryResolver::default();
        assert_eq!(resolver.tier_names(), vec!["static", "registry", "fuzzy"]);
    }

    #[test]
    fn test_korea_resolves_via_static_table() {
        let resolver = CountryResolver::default();
        let resolution = resolver.resolve(vec![candidate(0, "Korea", None)]);

        assert_eq!(resolution.records[0].iso_alpha, "KOR");
        assert_eq!(resolution.resolved_by("static"), 1);
        assert_eq!(resolution.resolved_by("registry"), 0);
        assert_eq!(resolution.resolved_by("fuzzy"), 0);
    }

    #[test]
    fn test_each_tier_handles_its_subset() {
        let resolver = CountryResolver::default();
        let resolution = resolver.resolve(vec![
            candidate(0, "Japan", Some("JPN")),
            candidate(1, "Russia", None),
            candidate(2, "Russian Federation", None),
            candidate(3, "Viet Nam", None),
            candidate(4, "Sweeden", None),
            candidate(5, "Narnia", None),
        ]);

        let codes: Vec<_> = resolution.records.iter().map(|r| r.iso_alpha.as_str()).collect();
        assert_eq!(codes, vec!["JPN", "RUS", "RUS", "VNM", "SWE"]);
        assert_eq!(resolution.resolved_by(SOURCE_TIER), 1);
        assert_eq!(resolution.resolved_by("static"), 1);
        assert_eq!(resolution.resolved_by("registry"), 2);
        assert_eq!(resolution.resolved_by("fuzzy"), 1);
        assert_eq!(resolution.dropped_countries(), vec!["Narnia"]);
    }

    #[test]
    fn test_input_order_preserved() {
        let resolver = CountryResolver::default();
        let resolution = resolver.resolve(vec![
            candidate(0, "Sweeden", None),
            candidate(1, "Korea", None),
            candidate(2, "Peru", Some("PER")),
        ]);

        let names: Vec<_> = resolution.records.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(names, vec!["Sweeden", "Korea", "Peru"]);
    }

    #[test]
    fn test_earlier_tier_wins() {
        let resolver = CountryResolver::with_tiers(vec![
            Box::new(StaticTable::new()),
            Box::new(Everything),
        ]);
        let resolution = resolver.resolve(vec![
            candidate(0, "Korea", None),
            candidate(1, "Narnia", None),
        ]);

        assert_eq!(resolution.records[0].iso_alpha, "KOR");
        assert_eq!(resolution.records[1].iso_alpha, "ZZZ");
    }

    #[test]
    fn test_source_code_is_kept() {
        let resolver = CountryResolver::with_tiers(vec![Box::new(Everything)]);
        let resolution = resolver.resolve(vec![candidate(0, "Korea", Some("KOR"))]);

        assert_eq!(resolution.records[0].iso_alpha, "KOR");
        assert_eq!(resolution.resolved_by("everything"), 0);
    }

    #[test]
    fn test_resolved_codes_are_alpha3() {
        let resolver = CountryResolver::default();
        let names = [
            "South Korea", "Czechia", "Cote d'Ivoire", "Bolivia", "Iran",
            "Micronesia (country)", "Democratic Republic of Congo", "Laos",
        ];
        let candidates = names
            .iter()
            .enumerate()
            .map(|(i, n)| candidate(i, n, None))
            .collect();
        let resolution = resolver.resolve(candidates);

        assert_eq!(resolution.records.len(), names.len());
        assert!(resolution.records.iter().all(|r| is_iso_alpha3(&r.iso_alpha)));
    }

    #[test]
    fn test_resolve_name() {
        let resolver = CountryResolver::default();

        assert_eq!(resolver.resolve_name("Korea"), Some(("static", "KOR")));
        assert_eq!(resolver.resolve_name("Republic of Chile"), Some(("registry", "CHL")));
        assert_eq!(resolver.resolve_name("chile"), Some(("fuzzy", "CHL")));
        assert_eq!(resolver.resolve_name("World"), None);
    }

    #[test]
    fn test_deterministic() {
        let resolver = CountryResolver::default();
        let input = vec![candidate(0, "Sweeden", None), candidate(1, "Korea", None)];

        assert_eq!(resolver.resolve(input.clone()), resolver.resolve(input));
    }
}
