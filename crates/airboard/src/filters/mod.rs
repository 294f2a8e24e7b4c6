//! Row filters applied after normalization.
//!
//! - **Aggregate removal**: drops "World", continents and income bands by
//!   exact name ([`AggregateFilter`]).
//!
//! - **Future dates**: drops rows dated after today in a fixed reference
//!   timezone ([`FutureDateFilter`]). Faults degrade to an explicit
//!   [`DateFilterOutcome::Unavailable`] rather than an error.
//!
//! # Example
//!
//! ```
//! use airboard::filters::{AggregateFilter, FutureDateFilter};
//! use airboard::NormalizedTable;
//!
//! let table = AggregateFilter::new().apply_table(NormalizedTable::fallback());
//! let outcome = FutureDateFilter::default().apply_records(table);
//! assert!(!outcome.is_unavailable());
//! ```

mod aggregates;
mod future;

pub use aggregates::{default_excluded_entities, AggregateFilter, CountryRow};
pub use future::{DateFilterOutcome, FutureDateFilter, DEFAULT_DATE_FIELD, DEFAULT_TIMEZONE};
