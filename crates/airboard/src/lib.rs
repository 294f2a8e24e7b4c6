//! `airboard` - PM2.5 exposure data for classroom air-quality dashboards
//!
//! This library fetches a public PM2.5 exposure dataset, normalizes it to
//! `country`, `iso_alpha`, `year`, `value`, and substitutes a built-in sample
//! whenever live data cannot be obtained. It also provides the small
//! calculators the dashboard shows next to the data.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cache;
pub mod calculators;
pub mod cli;
pub mod config;
pub mod countries;
pub mod error;
pub mod fetch;
pub mod filters;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod summary;
pub mod table;

pub use cache::{CacheKey, DatasetCache};
pub use config::Config;
pub use error::{Error, Result};
pub use fetch::Fetcher;
pub use logging::init_logging;
pub use pipeline::{DataOrigin, LoadedDataset, Pipeline, SampleReason};
pub use record::{NormalizedRecord, NormalizedTable};
pub use table::RawTable;
