//! Field normalization.
//!
//! Maps arbitrarily named source columns onto the canonical fields. Each field
//! is resolved by name first, then by a lower-case alias, then by position.

use tracing::debug;

use crate::error::{Error, Result};
use crate::record::is_iso_alpha3;
use crate::table::RawTable;

/// Column names tried for `country`, in order.
const COUNTRY_COLUMNS: [&str; 2] = ["Entity", "entity"];

/// Column position used when no country column is named.
const COUNTRY_POSITION: usize = 0;

/// Column names tried for `year`, in order.
const YEAR_COLUMNS: [&str; 2] = ["Year", "year"];

/// Column position used when no year column is named.
const YEAR_POSITION: usize = 2;

/// Column holding source-supplied ISO codes.
const CODE_COLUMN: &str = "Code";

/// A row with all four canonical fields, before country resolution.
///
/// `iso_alpha` is `None` when the source had no usable code.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRecord {
    /// Position of the row in the raw table.
    pub row: usize,
    /// Display name of the country.
    pub country: String,
    /// Upper-case alpha-3 code, if the source supplied a valid one.
    pub iso_alpha: Option<String>,
    /// Calendar year.
    pub year: i32,
    /// Concentration in µg/m³.
    pub value: f64,
}

/// Which columns of a raw table feed the canonical fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    /// Column for `country`.
    pub country: usize,
    /// Column for `year`.
    pub year: usize,
    /// Column for `iso_alpha`, if the source has one.
    pub code: Option<usize>,
    /// Column for `value`.
    pub value: usize,
}

impl FieldMapping {
    /// Resolve the mapping for `table` given the detected value column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::YearColumnNotFound`] when no year column is named and
    /// the table is too narrow for the positional fallback.
    pub fn resolve(table: &RawTable, value: usize) -> Result<Self> {
        let country = first_named(table, &COUNTRY_COLUMNS).unwrap_or(COUNTRY_POSITION);

        let year = match first_named(table, &YEAR_COLUMNS) {
            Some(index) => index,
            None if table.headers().len() > YEAR_POSITION => YEAR_POSITION,
            None => {
                return Err(Error::YearColumnNotFound {
                    columns: table.headers().to_vec(),
                })
            }
        };

        Ok(Self {
            country,
            year,
            code: table.column_index(CODE_COLUMN),
            value,
        })
    }
}

fn first_named(table: &RawTable, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| table.column_index(name))
}

/// Coerce a cell to a calendar year.
///
/// Accepts integers and floats without a fractional part ("2022.0").
#[must_use]
pub fn parse_year(cell: &str) -> Option<i32> {
    let cell = cell.trim();
    if let Ok(year) = cell.parse::<i32>() {
        return Some(year);
    }
    let float = cell.parse::<f64>().ok()?;
    if float.is_finite() && float.fract() == 0.0 {
        // Bounded by the i32 range check below.
        #[allow(clippy::cast_possible_truncation)]
        let year = float as i64;
        i32::try_from(year).ok()
    } else {
        None
    }
}

/// Coerce a cell to a non-negative, finite concentration.
#[must_use]
pub fn parse_value(cell: &str) -> Option<f64> {
    cell.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Normalize a source-supplied code, or `None` if it is not a usable alpha-3.
#[must_use]
pub fn parse_code(cell: &str) -> Option<String> {
    let code = cell.trim().to_ascii_uppercase();
    is_iso_alpha3(&code).then_some(code)
}

fn parse_country(cell: &str) -> Option<String> {
    let country = cell.trim();
    (!country.is_empty()).then(|| country.to_string())
}

/// Build candidate records from `table` using `mapping`.
///
/// Rows missing a country, year or value are dropped.
#[must_use]
pub fn normalize_fields(table: &RawTable, mapping: FieldMapping) -> Vec<CandidateRecord> {
    let candidates: Vec<CandidateRecord> = (0..table.len())
        .filter_map(|row| {
            let country = table.cell(row, mapping.country).and_then(parse_country)?;
            let year = table.cell(row, mapping.year).and_then(parse_year)?;
            let value = table.cell(row, mapping.value).and_then(parse_value)?;
            let iso_alpha = mapping
                .code
                .and_then(|col| table.cell(row, col))
                .and_then(parse_code);
            Some(CandidateRecord {
                row,
                country,
                iso_alpha,
                year,
                value,
            })
        })
        .collect();

    debug!(
        rows = table.len(),
        kept = candidates.len(),
        "Normalized fields"
    );
    candidates
}
