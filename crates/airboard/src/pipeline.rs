//! End-to-end dataset loading.
//!
//! [`Pipeline`] chains the stages that turn a fetched [`RawTable`] into a
//! [`NormalizedTable`]:
//!
//! ```text
//! Fetcher -> ColumnDetector -> field mapping -> CountryResolver
//!         -> AggregateFilter -> FutureDateFilter
//! ```
//!
//! Nothing here returns an error to the caller once a pipeline is built: a
//! missing fetch or a failed normalization yields the built-in sample dataset,
//! flagged through [`DataOrigin::Sample`].

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, DatasetCache};
use crate::config::Config;
use crate::countries::CountryResolver;
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::filters::{AggregateFilter, FutureDateFilter};
use crate::normalize::{ColumnDetector, Normalizer};
use crate::record::NormalizedTable;
use crate::table::RawTable;

/// Version of the normalization rules; part of every cache key.
pub const DATASET_VERSION: &str = "1";

/// Why the sample dataset was used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum SampleReason {
    /// Every fetch attempt failed.
    FetchFailed,
    /// The fetched table could not be normalized.
    NormalizationFailed(String),
}

/// Where a loaded dataset came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum DataOrigin {
    /// Normalized from the fetched source.
    Live,
    /// The built-in sample dataset.
    Sample {
        /// Why live data was not used.
        reason: SampleReason,
    },
}

/// A normalized table and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDataset {
    /// The records.
    pub table: NormalizedTable,
    /// Live or sample.
    pub origin: DataOrigin,
}

impl LoadedDataset {
    /// A dataset normalized from live data.
    #[must_use]
    pub fn live(table: NormalizedTable) -> Self {
        Self {
            table,
            origin: DataOrigin::Live,
        }
    }

    /// The sample dataset, used for `reason`.
    #[must_use]
    pub fn sample(reason: SampleReason) -> Self {
        Self {
            table: NormalizedTable::fallback(),
            origin: DataOrigin::Sample { reason },
        }
    }

    /// Check if this is sample rather than live data.
    ///
    /// Presentation code should disclose this to the user.
    #[must_use]
    pub fn is_sample(&self) -> bool {
        matches!(self.origin, DataOrigin::Sample { .. })
    }
}

/// The normalization pipeline.
#[derive(Debug)]
pub struct Pipeline {
    normalizer: Normalizer,
    resolver: CountryResolver,
    aggregates: AggregateFilter,
    future: FutureDateFilter,
}

impl Pipeline {
    /// Create a pipeline with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            normalizer: Normalizer::new(),
            resolver: CountryResolver::default(),
            aggregates: AggregateFilter::new(),
            future: FutureDateFilter::default(),
        }
    }

    /// Create a pipeline from the `[pipeline]` configuration section.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured timezone is unknown.
    pub fn from_config(config: &Config) -> Result<Self> {
        let settings = &config.pipeline;
        Ok(Self {
            normalizer: Normalizer::with_detector(ColumnDetector::with_extra_patterns(
                &settings.extra_value_patterns,
            )),
            resolver: CountryResolver::new(settings.fuzzy_threshold),
            aggregates: AggregateFilter::with_entities(settings.excluded_entities.clone()),
            future: FutureDateFilter::new(settings.timezone()?),
        })
    }

    /// Replace the future-date filter, e.g. to pin "today".
    #[must_use]
    pub fn with_future_filter(mut self, future: FutureDateFilter) -> Self {
        self.future = future;
        self
    }

    /// The future-date filter in use.
    #[must_use]
    pub fn future_filter(&self) -> &FutureDateFilter {
        &self.future
    }

    /// Normalize a raw table: detect, map, resolve codes, drop aggregates.
    ///
    /// Future dates are not removed here; see [`Pipeline::run`].
    ///
    /// # Errors
    ///
    /// Returns a normalization error if the value or year column cannot be
    /// found.
    pub fn normalize(&self, raw: &RawTable) -> Result<NormalizedTable> {
        let candidates = self.normalizer.normalize(raw)?;
        debug!(raw = raw.len(), candidates = candidates.len(), "Mapped fields");

        let resolution = self.resolver.resolve(candidates);
        if !resolution.dropped.is_empty() {
            debug!(
                dropped = resolution.dropped.len(),
                countries = ?resolution.dropped_countries(),
                "Dropped rows without a country code"
            );
        }

        let table = self
            .aggregates
            .apply_table(NormalizedTable::new(resolution.records));
        debug!(rows = table.len(), "Normalized table");
        Ok(table)
    }

    /// Produce a dataset from a fetch result, never failing.
    ///
    /// `None` or a table that cannot be normalized yields the sample
    /// dataset. Future years are removed either way.
    #[must_use]
    pub fn run(&self, raw: Option<RawTable>) -> LoadedDataset {
        let LoadedDataset { table, origin } = match raw {
            None => {
                warn!("No data fetched, using sample dataset");
                LoadedDataset::sample(SampleReason::FetchFailed)
            }
            Some(raw) => match self.normalize(&raw) {
                Ok(table) => LoadedDataset::live(table),
                Err(e) => {
                    warn!(error = %e, "Normalization failed, using sample dataset");
                    LoadedDataset::sample(SampleReason::NormalizationFailed(e.to_string()))
                }
            },
        };

        let table = self.future.apply_records(table).into_inner();
        LoadedDataset { table, origin }
    }

    /// Fetch and run.
    #[must_use]
    pub fn load(&self, fetcher: &Fetcher) -> LoadedDataset {
        let dataset = self.run(fetcher.fetch());
        if !dataset.is_sample() {
            info!(
                source = %fetcher.source_name(),
                rows = dataset.table.len(),
                "Loaded live dataset"
            );
        }
        dataset
    }

    /// Fetch and run, reusing a fresh cached result for the same source.
    pub fn load_cached(
        &self,
        fetcher: &Fetcher,
        cache: &mut DatasetCache,
        now: Instant,
    ) -> Arc<LoadedDataset> {
        let key = CacheKey::new(fetcher.source_name(), DATASET_VERSION);
        cache.get_or_load(&key, now, || self.load(fetcher))
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the fetcher for `config`.
///
/// `file` overrides the configured source; otherwise a configured local path
/// wins over the URL.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn fetcher_for(config: &Config, file: Option<&Path>) -> Result<Fetcher> {
    let policy = config.retry_policy();
    match file.or(config.source.local_path.as_deref()) {
        Some(path) => Ok(Fetcher::file(path, policy)),
        None => Fetcher::http(config.source.url.as_str(), policy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::fetch::{DataSource, RetryPolicy};
    use crate::logging::init_test_logging;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// 2024-01-01 00:00 in Seoul.
    fn new_year_in_seoul() -> Pipeline {
        let now = Utc.with_ymd_and_hms(2023, 12, 31, 15, 0, 0).unwrap();
        Pipeline::new().with_future_filter(FutureDateFilter::default().at(now))
    }

    fn raw(text: &str) -> RawTable {
        RawTable::from_csv_str(text).unwrap()
    }

    struct CountingSource {
        body: Option<&'static str>,
        reads: AtomicU32,
    }

    impl DataSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        fn read(&self) -> Result<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.body
                .map(String::from)
                .ok_or_else(|| Error::fetch("counting", "offline"))
        }
    }

    fn counting_fetcher(body: Option<&'static str>) -> (Fetcher, Arc<CountingSource>) {
        struct Shared(Arc<CountingSource>);

        impl DataSource for Shared {
            fn name(&self) -> &str {
                self.0.name()
            }

            fn read(&self) -> Result<String> {
                self.0.read()
            }
        }

        let source = Arc::new(CountingSource {
            body,
            reads: AtomicU32::new(0),
        });
        let fetcher = Fetcher::new(
            Box::new(Shared(Arc::clone(&source))),
            RetryPolicy::immediate(1),
        );
        (fetcher, source)
    }

    #[test]
    fn test_future_year_dropped() {
        let dataset = new_year_in_seoul().run(Some(raw(
            "Entity,Code,Year,Avg PM2.5 exposure\n\
             South Korea,KOR,2030,25.0\n\
             South Korea,KOR,2022,24.1\n",
        )));

        assert!(!dataset.is_sample());
        assert_eq!(dataset.table.len(), 1);
        assert_eq!(dataset.table.records()[0].year, 2022);
        assert!((dataset.table.records()[0].value - 24.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_blank_code_resolved_via_static_table() {
        let pipeline = new_year_in_seoul();
        let table = raw("Entity,Code,Year,PM2.5\nKorea,,2020,26.0\n");

        let dataset = pipeline.run(Some(table.clone()));
        assert_eq!(dataset.table.records()[0].iso_alpha, "KOR");

        let candidates = Normalizer::new().normalize(&table).unwrap();
        let resolution = CountryResolver::default().resolve(candidates);
        assert_eq!(resolution.resolved_by("static"), 1);
        assert_eq!(resolution.resolved_by("registry"), 0);
        assert_eq!(resolution.resolved_by("fuzzy"), 0);
    }

    #[test]
    fn test_missing_value_column_yields_fallback() {
        init_test_logging();
        let pipeline = new_year_in_seoul();
        let table = raw("Entity,Code,Year,Population\nPeru,PER,2020,33000000\n");

        assert!(matches!(
            pipeline.normalize(&table),
            Err(Error::ValueColumnNotFound { .. })
        ));

        let dataset = pipeline.run(Some(table));
        assert_eq!(dataset.table, NormalizedTable::fallback());
        assert!(matches!(
            dataset.origin,
            DataOrigin::Sample {
                reason: SampleReason::NormalizationFailed(_)
            }
        ));
    }

    #[test]
    fn test_fetch_exhaustion_yields_flagged_fallback() {
        init_test_logging();
        let (fetcher, source) = counting_fetcher(None);

        let dataset = new_year_in_seoul().load(&fetcher);

        assert_eq!(source.reads.load(Ordering::SeqCst), 2);
        assert_eq!(dataset.table, NormalizedTable::fallback());
        assert!(dataset.is_sample());
        assert_eq!(
            dataset.origin,
            DataOrigin::Sample {
                reason: SampleReason::FetchFailed
            }
        );
    }

    #[test]
    fn test_run_is_idempotent() {
        let pipeline = new_year_in_seoul();
        let text = "Entity,Code,Year,Average exposure\n\
                    Germany,DEU,2019,11.2\n\
                    World,OWID_WRL,2019,31.7\n\
                    Russia,,2019,14.0\n\
                    Narnia,,2019,1.0\n\
                    Sweeden,,2019,5.5\n";

        let first = pipeline.run(Some(raw(text)));
        let second = pipeline.run(Some(raw(text)));

        assert_eq!(first.table.to_csv_string().unwrap(), second.table.to_csv_string().unwrap());
        assert_eq!(first.table.fingerprint().unwrap(), second.table.fingerprint().unwrap());
    }

    #[test]
    fn test_output_invariants() {
        let pipeline = new_year_in_seoul();
        let dataset = pipeline.run(Some(raw(
            "Entity,Code,Year,PM2.5 (ug/m3)\n\
             World,OWID_WRL,2019,31.7\n\
             Europe,,2019,12.0\n\
             Narnia,,2019,1.0\n\
             Chile,CHL,2019,21.3\n\
             Chile,CHL,2025,20.0\n\
             Peru,PER,n/a,20.0\n",
        )));

        let countries: Vec<&str> = dataset.table.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(countries, vec!["Chile"]);
        assert!(dataset
            .table
            .iter()
            .all(|r| crate::record::is_iso_alpha3(&r.iso_alpha) && r.year <= 2024));
    }

    #[test]
    fn test_load_cached_reuses_dataset() {
        let (fetcher, source) = counting_fetcher(Some(
            "Entity,Code,Year,PM2.5\nJapan,JPN,2019,11.0\n",
        ));
        let pipeline = new_year_in_seoul();
        let mut cache = DatasetCache::new(Duration::from_secs(3600));
        let now = Instant::now();

        let first = pipeline.load_cached(&fetcher, &mut cache, now);
        let second = pipeline.load_cached(&fetcher, &mut cache, now + Duration::from_secs(10));

        assert_eq!(source.reads.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.table.records()[0].iso_alpha, "JPN");

        let later = pipeline.load_cached(&fetcher, &mut cache, now + Duration::from_secs(3600));
        assert_eq!(source.reads.load(Ordering::SeqCst), 2);
        assert!(!Arc::ptr_eq(&first, &later));
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.pipeline.extra_value_patterns = vec!["particulate".to_string()];
        config.pipeline.excluded_entities = vec!["Chile".to_string()];

        let pipeline = Pipeline::from_config(&config)
            .unwrap()
            .with_future_filter(new_year_in_seoul().future);
        let dataset = pipeline.run(Some(raw(
            "Entity,Code,Year,Particulate matter\n\
             Chile,CHL,2019,21.3\n\
             Peru,PER,2019,20.0\n",
        )));

        assert!(!dataset.is_sample());
        assert_eq!(dataset.table.len(), 1);
        assert_eq!(dataset.table.records()[0].country, "Peru");
    }

    #[test]
    fn test_from_config_rejects_unknown_timezone() {
        let mut config = Config::default();
        config.pipeline.timezone = "Nowhere/Special".to_string();

        assert!(matches!(
            Pipeline::from_config(&config),
            Err(Error::InvalidTimezone { .. })
        ));
    }

    #[test]
    fn test_fetcher_for_prefers_file_override() {
        let mut config = Config::default();
        config.source.local_path = Some("/data/configured.csv".into());

        let fetcher = fetcher_for(&config, Some(Path::new("/data/override.csv"))).unwrap();
        assert_eq!(fetcher.source_name(), "/data/override.csv");

        let fetcher = fetcher_for(&config, None).unwrap();
        assert_eq!(fetcher.source_name(), "/data/configured.csv");
    }
}
