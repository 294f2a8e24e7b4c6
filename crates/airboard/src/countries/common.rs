//! Curated country names.
//!
//! Everyday and historical spellings that the ISO registry lists differently
//! (or not at all), matched verbatim.

use std::collections::HashMap;

use super::ResolutionTier;

/// Curated name → alpha-3 pairs.
const COMMON_NAMES: &[(&str, &str)] = &[
    ("South Korea", "KOR"),
    ("Korea", "KOR"),
    ("United States", "USA"),
    ("United Kingdom", "GBR"),
    ("China", "CHN"),
    ("India", "IND"),
    ("Japan", "JPN"),
    ("Germany", "DEU"),
    ("France", "FRA"),
    ("Italy", "ITA"),
    ("Spain", "ESP"),
    ("Brazil", "BRA"),
    ("Russia", "RUS"),
    ("Australia", "AUS"),
    ("Canada", "CAN"),
    ("Mexico", "MEX"),
    ("Indonesia", "IDN"),
    ("Turkey", "TUR"),
    ("Saudi Arabia", "SAU"),
    ("Argentina", "ARG"),
    ("South Africa", "ZAF"),
    ("Thailand", "THA"),
    ("Malaysia", "MYS"),
    ("Singapore", "SGP"),
    ("Philippines", "PHL"),
    ("Vietnam", "VNM"),
    ("Bangladesh", "BGD"),
    ("Pakistan", "PAK"),
    ("Nigeria", "NGA"),
    ("Egypt", "EGY"),
    ("Iran", "IRN"),
    ("Iraq", "IRQ"),
    ("Israel", "ISR"),
    ("United Arab Emirates", "ARE"),
    ("Norway", "NOR"),
    ("Sweden", "SWE"),
    ("Denmark", "DNK"),
    ("Finland", "FIN"),
    ("Iceland", "ISL"),
    ("Netherlands", "NLD"),
    ("Belgium", "BEL"),
    ("Switzerland", "CHE"),
    ("Austria", "AUT"),
    ("Portugal", "PRT"),
    ("Greece", "GRC"),
    ("Poland", "POL"),
    ("Czech Republic", "CZE"),
    ("Hungary", "HUN"),
    ("Romania", "ROU"),
    ("Bulgaria", "BGR"),
    ("Croatia", "HRV"),
    ("Serbia", "SRB"),
    ("Ukraine", "UKR"),
    ("Belarus", "BLR"),
    ("Lithuania", "LTU"),
    ("Latvia", "LVA"),
    ("Estonia", "EST"),
    ("Ireland", "IRL"),
    ("New Zealand", "NZL"),
    ("Chile", "CHL"),
    ("Peru", "PER"),
    ("Colombia", "COL"),
    ("Venezuela", "VEN"),
    ("Ecuador", "ECU"),
    ("Bolivia", "BOL"),
    ("Paraguay", "PRY"),
    ("Uruguay", "URY"),
    ("Kenya", "KEN"),
    ("Ethiopia", "ETH"),
    ("Ghana", "GHA"),
    ("Morocco", "MAR"),
    ("Algeria", "DZA"),
    ("Tunisia", "TUN"),
    ("Libya", "LBY"),
    ("Sudan", "SDN"),
    ("Kazakhstan", "KAZ"),
    ("Uzbekistan", "UZB"),
    ("Afghanistan", "AFG"),
    ("Mongolia", "MNG"),
    ("Nepal", "NPL"),
    ("Sri Lanka", "LKA"),
    ("Myanmar", "MMR"),
    ("Cambodia", "KHM"),
    ("Laos", "LAO"),
    // Our World in Data spellings
    ("USA", "USA"),
    ("UK", "GBR"),
    ("Czechia", "CZE"),
    ("North Korea", "PRK"),
    ("Taiwan", "TWN"),
    ("Syria", "SYR"),
    ("Tanzania", "TZA"),
    ("Moldova", "MDA"),
    ("Brunei", "BRN"),
    ("Palestine", "PSE"),
    ("North Macedonia", "MKD"),
    ("Democratic Republic of Congo", "COD"),
    ("Congo", "COG"),
    ("Cote d'Ivoire", "CIV"),
    ("Cape Verde", "CPV"),
    ("East Timor", "TLS"),
    ("Micronesia (country)", "FSM"),
];

/// First tier: the curated name table.
#[derive(Debug, Clone)]
pub struct StaticTable {
    entries: HashMap<&'static str, &'static str>,
}

impl StaticTable {
    /// Build the table from the curated names.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: COMMON_NAMES.iter().copied().collect(),
        }
    }

    /// Number of curated names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The code for a curated name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'static str> {
        self.entries.get(name).copied()
    }
}

impl Default for StaticTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolutionTier for StaticTable {
    fn name(&self) -> &'static str {
        "static"
    }

    fn resolve(&self, country: &str) -> Option<&'static str> {
        self.get(country)
    }
}
