//! Raw-table normalization.
//!
//! Turns a schema-less [`RawTable`] into [`CandidateRecord`]s carrying the four
//! canonical fields:
//!
//! - **Column detection**: finds the pollutant measurement column among
//!   arbitrarily named columns ([`ColumnDetector`]).
//!
//! - **Field mapping**: resolves `country`, `year` and `iso_alpha` by name,
//!   lower-case alias, then position ([`FieldMapping`]).
//!
//! - **Coercion**: non-numeric years and values become missing, and rows
//!   missing any required field are dropped.
//!
//! # Example
//!
//! ```
//! use airboard::normalize::Normalizer;
//! use airboard::RawTable;
//!
//! let raw = RawTable::from_csv_str(
//!     "Entity,Code,Year,Avg PM2.5 exposure\nSouth Korea,KOR,2022,24.1\n",
//! )
//! .unwrap();
//!
//! let rows = Normalizer::new().normalize(&raw).unwrap();
//! assert_eq!(rows[0].year, 2022);
//! ```

mod detector;
mod fields;

pub(crate) use detector::compile_custom;
pub use detector::{generic_value_patterns, pollutant_patterns, ColumnDetector, ColumnPattern};
pub use fields::{
    normalize_fields, parse_code, parse_value, parse_year, CandidateRecord, FieldMapping,
};

use crate::error::{Error, Result};
use crate::table::RawTable;

/// Detects the value column and maps a raw table onto the canonical fields.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    detector: ColumnDetector,
}

impl Normalizer {
    /// Create a normalizer with the built-in column patterns.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a normalizer with a custom detector.
    #[must_use]
    pub fn with_detector(detector: ColumnDetector) -> Self {
        Self { detector }
    }

    /// The column detector in use.
    #[must_use]
    pub fn detector(&self) -> &ColumnDetector {
        &self.detector
    }

    /// Normalize `table` into candidate records.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValueColumnNotFound`] if no pollutant column is
    /// detected, or [`Error::YearColumnNotFound`] if no year column exists.
    pub fn normalize(&self, table: &RawTable) -> Result<Vec<CandidateRecord>> {
        let value = self
            .detector
            .detect_index(table.headers())
            .ok_or_else(|| Error::ValueColumnNotFound {
                columns: table.headers().to_vec(),
            })?;

        let mapping = FieldMapping::resolve(table, value)?;
        Ok(normalize_fields(table, mapping))
    }
}
