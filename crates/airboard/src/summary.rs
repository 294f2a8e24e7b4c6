//! Read-only views over a normalized table.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::Serialize;

use crate::record::{NormalizedRecord, NormalizedTable};

/// Countries shown in the trend view when none are requested.
pub const MAJOR_COUNTRIES: [&str; 6] = [
    "South Korea",
    "China",
    "India",
    "United States",
    "Germany",
    "Japan",
];

/// Distinct years, ascending.
#[must_use]
pub fn years(table: &NormalizedTable) -> Vec<i32> {
    table
        .iter()
        .map(|r| r.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// The most recent year in the table.
#[must_use]
pub fn latest_year(table: &NormalizedTable) -> Option<i32> {
    table.iter().map(|r| r.year).max()
}

/// Records of one year, in table order.
#[must_use]
pub fn for_year(table: &NormalizedTable, year: i32) -> Vec<&NormalizedRecord> {
    table.iter().filter(|r| r.year == year).collect()
}

/// Highest and lowest exposures of one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking<'a> {
    /// Year ranked.
    pub year: i32,
    /// Highest values, descending.
    pub top: Vec<&'a NormalizedRecord>,
    /// Lowest values, still in descending order.
    pub bottom: Vec<&'a NormalizedRecord>,
}

/// Rank the records of `year` (default: latest) by value.
///
/// Returns `None` when the table is empty or has no rows for the year.
#[must_use]
pub fn ranking(table: &NormalizedTable, year: Option<i32>, n: usize) -> Option<Ranking<'_>> {
    let year = year.or_else(|| latest_year(table))?;
    let mut rows = for_year(table, year);
    if rows.is_empty() {
        return None;
    }

    // Stable sort keeps source order among equal values
    rows.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));

    let top = rows.iter().take(n).copied().collect();
    let bottom = rows[rows.len().saturating_sub(n)..].to_vec();
    Some(Ranking { year, top, bottom })
}

/// Series for the given countries, ordered by country then year.
///
/// Countries are matched by exact display name.
#[must_use]
pub fn trend<'a, S: AsRef<str>>(
    table: &'a NormalizedTable,
    countries: &[S],
) -> Vec<&'a NormalizedRecord> {
    let mut rows: Vec<&NormalizedRecord> = table
        .iter()
        .filter(|r| countries.iter().any(|c| c.as_ref() == r.country))
        .collect();
    rows.sort_by(|a, b| a.country.cmp(&b.country).then(a.year.cmp(&b.year)));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> NormalizedTable {
        NormalizedTable::new(vec![
            NormalizedRecord::new("Japan", "JPN", 2020, 12.0),
            NormalizedRecord::new("India", "IND", 2019, 90.0),
            NormalizedRecord::new("Japan", "JPN", 2019, 13.0),
            NormalizedRecord::new("India", "IND", 2020, 88.0),
            NormalizedRecord::new("Finland", "FIN", 2020, 5.0),
            NormalizedRecord::new("Peru", "PER", 2020, 20.0),
        ])
    }

    #[test]
    fn test_years() {
        let table = table();
        assert_eq!(years(&table), vec![2019, 2020]);
        assert_eq!(latest_year(&table), Some(2020));
        assert_eq!(latest_year(&NormalizedTable::default()), None);
    }

    #[test]
    fn test_ranking_latest_year() {
        let table = table();
        let ranking = ranking(&table, None, 2).unwrap();

        assert_eq!(ranking.year, 2020);
        let top: Vec<&str> = ranking.top.iter().map(|r| r.country.as_str()).collect();
        let bottom: Vec<&str> = ranking.bottom.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(top, vec!["India", "Peru"]);
        assert_eq!(bottom, vec!["Japan", "Finland"]);
    }

    #[test]
    fn test_ranking_small_year() {
        let table = table();
        let ranking = ranking(&table, Some(2019), 10).unwrap();

        assert_eq!(ranking.top.len(), 2);
        assert_eq!(ranking.top, ranking.bottom);
        assert!(super::ranking(&table, Some(1990), 10).is_none());
    }

    #[test]
    fn test_trend_order() {
        let table = table();
        let rows = trend(&table, &["Japan", "India", "Atlantis"]);

        let keys: Vec<(&str, i32)> = rows.iter().map(|r| (r.country.as_str(), r.year)).collect();
        assert_eq!(
            keys,
            vec![("India", 2019), ("India", 2020), ("Japan", 2019), ("Japan", 2020)]
        );
    }

    #[test]
    fn test_trend_major_countries_on_fallback() {
        let table = NormalizedTable::fallback();
        let rows = trend(&table, &MAJOR_COUNTRIES);

        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].country, "China");
    }
}
