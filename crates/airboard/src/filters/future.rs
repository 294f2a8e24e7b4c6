//! Future-date removal.
//!
//! Drops rows dated after "today" as observed in a fixed reference timezone,
//! independent of the caller's clock. A column is read as bare years when
//! every non-blank cell is numeric, otherwise as dates.
//!
//! Cells that are missing or fail to parse drop their row. Bare years and
//! year-months in a date column count from the first day of the period.
//! The filter never fails. An internal fault yields
//! [`DateFilterOutcome::Unavailable`] carrying the unfiltered input.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::record::NormalizedTable;
use crate::table::RawTable;

/// Reference timezone used when none is configured.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Seoul;

/// Field filtered when none is named.
pub const DEFAULT_DATE_FIELD: &str = "date";

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Result of applying the future-date filter.
#[derive(Debug, Clone, PartialEq)]
pub enum DateFilterOutcome<T> {
    /// Rows dated after today were removed.
    Filtered(T),

    /// The filter could not run; the input is returned untouched.
    Unavailable {
        /// The unfiltered input.
        original: T,

        /// Why the filter could not run.
        reason: String,
    },
}

impl<T> DateFilterOutcome<T> {
    /// The filtered data, or the original when the filter was unavailable.
    pub fn into_inner(self) -> T {
        match self {
            Self::Filtered(data) | Self::Unavailable { original: data, .. } => data,
        }
    }

    /// Borrow the data carried by this outcome.
    pub fn get(&self) -> &T {
        match self {
            Self::Filtered(data) | Self::Unavailable { original: data, .. } => data,
        }
    }

    /// Check if the filter degraded to a no-op.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Removes rows dated after today in the reference timezone.
#[derive(Debug, Clone, Copy)]
pub struct FutureDateFilter {
    timezone: Tz,
    now: Option<DateTime<Utc>>,
}

impl FutureDateFilter {
    /// Create a filter for `timezone` using the system clock.
    #[must_use]
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            now: None,
        }
    }

    /// Pin "now" to a fixed instant.
    #[must_use]
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// The reference timezone.
    #[must_use]
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// The current instant, pinned or from the system clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    /// Today's date in the reference timezone.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.now().with_timezone(&self.timezone).date_naive()
    }

    /// The current year in the reference timezone.
    #[must_use]
    pub fn current_year(&self) -> i32 {
        self.today().year()
    }

    /// Local midnight at the start of today, as an instant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DateFilter`] if midnight does not exist in the
    /// reference timezone today.
    pub fn start_of_today(&self) -> Result<DateTime<Utc>> {
        let today = self.today();
        local_instant(self.timezone, today.and_time(NaiveTime::MIN)).ok_or_else(|| {
            Error::date_filter(format!("no local midnight on {today} in {}", self.timezone))
        })
    }

    /// Filter a raw table on the named year or date column.
    ///
    /// An absent column leaves the table unchanged.
    #[must_use]
    pub fn apply_table(&self, table: RawTable, field: &str) -> DateFilterOutcome<RawTable> {
        let Some(column) = table.column_index(field) else {
            debug!(field = %field, "Date field absent, nothing to filter");
            return DateFilterOutcome::Filtered(table);
        };

        match self.keep_mask(&table, column) {
            Ok(mask) => {
                let before = table.len();
                let mut keep = mask.into_iter();
                let filtered = table.retain_rows(|_| keep.next().unwrap_or(false));
                debug!(field = %field, before, after = filtered.len(), "Removed future dates");
                DateFilterOutcome::Filtered(filtered)
            }
            Err(e) => {
                warn!(field = %field, error = %e, "Future-date filter unavailable, keeping all rows");
                DateFilterOutcome::Unavailable {
                    original: table,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Filter normalized records on their `year`.
    #[must_use]
    pub fn apply_records(&self, table: NormalizedTable) -> DateFilterOutcome<NormalizedTable> {
        let year = self.current_year();
        let before = table.len();
        let filtered = table.retain(|r| r.year <= year);
        debug!(current_year = year, before, after = filtered.len(), "Removed future years");
        DateFilterOutcome::Filtered(filtered)
    }

    fn keep_mask(&self, table: &RawTable, column: usize) -> Result<Vec<bool>> {
        // A missing cell is unparseable, so its row is dropped.
        let cells: Vec<&str> = table
            .rows()
            .iter()
            .map(|cells| cells.get(column).map_or("", |c| c.trim()))
            .collect();

        if is_numeric_column(&cells) {
            let year = f64::from(self.current_year());
            return Ok(cells
                .iter()
                .map(|c| c.parse::<f64>().is_ok_and(|v| v <= year))
                .collect());
        }

        let cutoff = self.start_of_today()?;
        Ok(cells
            .iter()
            .map(|c| parse_instant(c, self.timezone).is_some_and(|d| d <= cutoff))
            .collect())
    }
}

impl Default for FutureDateFilter {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEZONE)
    }
}

/// Every non-blank cell parses as a number.
fn is_numeric_column(cells: &[&str]) -> bool {
    cells
        .iter()
        .filter(|c| !c.is_empty())
        .all(|c| c.parse::<f64>().is_ok())
}

fn local_instant(timezone: Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    timezone
        .from_local_datetime(&naive)
        .earliest()
        .map(|d| d.with_timezone(&Utc))
}

/// Parse a timestamp or date. Values without an offset are local to `timezone`.
fn parse_instant(cell: &str, timezone: Tz) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(cell) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(naive) = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(cell, f).ok())
    {
        return local_instant(timezone, naive);
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(cell, f).ok())
        .or_else(|| parse_period_start(cell))
        .and_then(|d| local_instant(timezone, d.and_time(NaiveTime::MIN)))
}

/// First day of a bare year (`2022`) or year-month (`2022-03`).
fn parse_period_start(cell: &str) -> Option<NaiveDate> {
    if cell.len() == 4 && cell.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::from_ymd_opt(cell.parse().ok()?, 1, 1);
    }
    NaiveDate::parse_from_str(&format!("{cell}-01"), "%Y-%m-%d").ok()
}
