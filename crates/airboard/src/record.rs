//! Canonical exposure records.
//!
//! This module defines the normalized shape every consumer reads:
//! `country`, `iso_alpha`, `year`, `value`. A [`NormalizedTable`] is immutable
//! once produced; consumers derive filtered copies instead of editing it.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Countries, codes and concentrations of the built-in sample dataset.
const FALLBACK_ROWS: [(&str, &str, f64); 10] = [
    ("South Korea", "KOR", 25.0),
    ("China", "CHN", 85.0),
    ("India", "IND", 95.0),
    ("Finland", "FIN", 6.0),
    ("Iceland", "ISL", 5.0),
    ("United States", "USA", 12.0),
    ("Germany", "DEU", 8.5),
    ("Japan", "JPN", 15.2),
    ("Brazil", "BRA", 18.3),
    ("Australia", "AUS", 7.8),
];

/// Year of every row in the sample dataset.
const FALLBACK_YEAR: i32 = 2022;

/// One country-year PM2.5 exposure measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Display name of the country.
    pub country: String,

    /// ISO 3166-1 alpha-3 code, upper case.
    pub iso_alpha: String,

    /// Calendar year of the measurement.
    pub year: i32,

    /// Mean annual PM2.5 concentration in µg/m³.
    pub value: f64,
}

impl NormalizedRecord {
    /// Create a new record.
    #[must_use]
    pub fn new(
        country: impl Into<String>,
        iso_alpha: impl Into<String>,
        year: i32,
        value: f64,
    ) -> Self {
        Self {
            country: country.into(),
            iso_alpha: iso_alpha.into(),
            year,
            value,
        }
    }
}

/// Check that a code is exactly three upper-case ASCII letters.
#[must_use]
pub fn is_iso_alpha3(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}

/// An ordered collection of normalized records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTable {
    records: Vec<NormalizedRecord>,
}

impl NormalizedTable {
    /// Create a table from records.
    #[must_use]
    pub fn new(records: Vec<NormalizedRecord>) -> Self {
        Self { records }
    }

    /// The built-in sample dataset used when live data is unavailable.
    ///
    /// Ten countries, one year; already satisfies every record invariant.
    #[must_use]
    pub fn fallback() -> Self {
        let records = FALLBACK_ROWS
            .iter()
            .map(|(country, code, value)| {
                NormalizedRecord::new(*country, *code, FALLBACK_YEAR, *value)
            })
            .collect();
        Self { records }
    }

    /// All records in order.
    #[must_use]
    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    /// Iterate over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, NormalizedRecord> {
        self.records.iter()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the table has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Derive a copy holding only the records matching `keep`.
    #[must_use]
    pub fn filtered(&self, mut keep: impl FnMut(&NormalizedRecord) -> bool) -> Self {
        Self {
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Consume the table, keeping only the records matching `keep`.
    #[must_use]
    pub fn retain(mut self, mut keep: impl FnMut(&NormalizedRecord) -> bool) -> Self {
        self.records.retain(|r| keep(r));
        self
    }

    /// Serialize to CSV with the header `country,iso_alpha,year,value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the CSV writer fails.
    pub fn to_csv_string(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        if self.records.is_empty() {
            writer.write_record(["country", "iso_alpha", "year", "value"])?;
        }
        for record in &self.records {
            writer.serialize(record)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| Error::internal(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| Error::internal(e.to_string()))
    }

    /// BLAKE3 hex digest of the CSV serialization.
    ///
    /// Two tables with the same fingerprint are byte-identical when exported.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn fingerprint(&self) -> Result<String> {
        let csv = self.to_csv_string()?;
        Ok(blake3::hash(csv.as_bytes()).to_hex().to_string())
    }
}

impl From<Vec<NormalizedRecord>> for NormalizedTable {
    fn from(records: Vec<NormalizedRecord>) -> Self {
        Self::new(records)
    }
}

impl<'a> IntoIterator for &'a NormalizedTable {
    type Item = &'a NormalizedRecord;
    type IntoIter = std::slice::Iter<'a, NormalizedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_shape() {
        let table = NormalizedTable::fallback();

        assert_eq!(table.len(), 10);
        assert!(table.iter().all(|r| r.year == 2022));
        assert!(table.iter().all(|r| is_iso_alpha3(&r.iso_alpha)));
        assert!(table.iter().all(|r| r.value >= 0.0));
        assert_eq!(table.records()[0].country, "South Korea");
        assert_eq!(table.records()[0].iso_alpha, "KOR");
    }

    #[test]
    fn test_is_iso_alpha3() {
        assert!(is_iso_alpha3("KOR"));
        assert!(!is_iso_alpha3("kor"));
        assert!(!is_iso_alpha3("KO"));
        assert!(!is_iso_alpha3("OWID_WRL"));
        assert!(!is_iso_alpha3("K0R"));
    }

    #[test]
    fn test_to_csv_string() {
        let table = NormalizedTable::new(vec![
            NormalizedRecord::new("South Korea", "KOR", 2022, 24.1),
            NormalizedRecord::new("Finland", "FIN", 2021, 6.0),
        ]);
        let csv = table.to_csv_string().unwrap();

        assert_eq!(
            csv,
            "country,iso_alpha,year,value\nSouth Korea,KOR,2022,24.1\nFinland,FIN,2021,6.0\n"
        );
    }

    #[test]
    fn test_empty_table_csv_has_header() {
        let csv = NormalizedTable::default().to_csv_string().unwrap();
        assert_eq!(csv, "country,iso_alpha,year,value\n");
    }

    #[test]
    fn test_fingerprint_consistency() {
        let a = NormalizedTable::fallback().fingerprint().unwrap();
        let b = NormalizedTable::fallback().fingerprint().unwrap();
        assert_eq!(a, b);

        let other = NormalizedTable::fallback()
            .retain(|r| r.iso_alpha != "KOR")
            .fingerprint()
            .unwrap();
        assert_ne!(a, other);
    }

    #[test]
    fn test_filtered_leaves_original() {
        let table = NormalizedTable::fallback();
        let high = table.filtered(|r| r.value > 50.0);

        assert_eq!(high.len(), 2);
        assert_eq!(table.len(), 10);
    }

    #[test]
    fn test_record_serialization() {
        let record = NormalizedRecord::new("Japan", "JPN", 2020, 15.2);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"iso_alpha\":\"JPN\""));
    }
}
