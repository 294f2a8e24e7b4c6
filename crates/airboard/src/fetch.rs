//! Raw data retrieval.
//!
//! A [`Fetcher`] reads CSV text from a [`DataSource`] with a bounded number
//! of attempts and parses it into a [`RawTable`]. Exhausting the attempts is
//! not an error: the fetcher returns `None` and the caller decides what to
//! show instead.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::table::RawTable;

/// Our World in Data PM2.5 exposure table, full history with short column names.
pub const DEFAULT_SOURCE_URL: &str = "https://ourworldindata.org/grapher/average-exposure-pm25-pollution.csv?v=1&csvType=full&useColumnShortNames=true";

/// Somewhere CSV text can be read from.
pub trait DataSource: Send + Sync {
    /// Identifier for logs and cache keys (URL or path).
    fn name(&self) -> &str;

    /// Read the full CSV text.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read.
    fn read(&self) -> Result<String>;
}

/// CSV over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpSource {
    /// Create a source for `url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("airboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

impl DataSource for HttpSource {
    fn name(&self) -> &str {
        &self.url
    }

    fn read(&self) -> Result<String> {
        let response = self.client.get(&self.url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(&self.url, format!("HTTP {status}")));
        }
        Ok(response.text()?)
    }
}

/// A local copy of the dataset.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    /// Create a source reading `path`.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path.display().to_string();
        Self { path, name }
    }

    /// The file being read.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|source| Error::FileRead {
            path: self.path.clone(),
            source,
        })
    }
}

/// How many times to try a source and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,

    /// Per-attempt timeout for network sources.
    pub timeout: Duration,

    /// Wait after the first failed attempt.
    pub base_delay: Duration,

    /// Extra wait added for each further failed attempt.
    pub step_delay: Duration,
}

impl RetryPolicy {
    /// A policy that retries immediately.
    #[must_use]
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            timeout: Duration::from_secs(10),
            base_delay: Duration::ZERO,
            step_delay: Duration::ZERO,
        }
    }

    /// Total number of attempts.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait after the failed attempt numbered `attempt` (zero-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay + self.step_delay.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            timeout: Duration::from_secs(10),
            base_delay: Duration::from_secs(1),
            step_delay: Duration::from_secs(2),
        }
    }
}

/// Reads a source with retries.
pub struct Fetcher {
    source: Box<dyn DataSource>,
    policy: RetryPolicy,
}

impl Fetcher {
    /// Create a fetcher for `source`.
    #[must_use]
    pub fn new(source: Box<dyn DataSource>, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    /// Fetcher for a URL over HTTP(S), using the policy's timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn http(url: impl Into<String>, policy: RetryPolicy) -> Result<Self> {
        let source = HttpSource::new(url, policy.timeout)?;
        Ok(Self::new(Box::new(source), policy))
    }

    /// Fetcher for a local file.
    #[must_use]
    pub fn file(path: impl AsRef<Path>, policy: RetryPolicy) -> Self {
        Self::new(Box::new(FileSource::new(path)), policy)
    }

    /// Name of the underlying source.
    #[must_use]
    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// The retry policy.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Read and parse the source, or `None` once every attempt has failed.
    ///
    /// Unparseable CSV counts as a failed attempt.
    #[must_use]
    pub fn fetch(&self) -> Option<RawTable> {
        let attempts = self.policy.attempts();
        for attempt in 0..attempts {
            match self.try_once() {
                Ok(table) => {
                    info!(
                        source = %self.source.name(),
                        rows = table.len(),
                        attempt = attempt + 1,
                        "Fetched raw table"
                    );
                    return Some(table);
                }
                Err(e) => {
                    warn!(
                        source = %self.source.name(),
                        attempt = attempt + 1,
                        attempts,
                        error = %e,
                        "Fetch attempt failed"
                    );
                    if attempt + 1 < attempts {
                        let delay = self.policy.delay(attempt);
                        debug!(delay = ?delay, "Waiting before retry");
                        thread::sleep(delay);
                    }
                }
            }
        }

        warn!(source = %self.source.name(), attempts, "All fetch attempts failed");
        None
    }

    fn try_once(&self) -> Result<RawTable> {
        let text = self.source.read()?;
        RawTable::from_csv_str(&text)
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("source", &self.source.name())
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Fails a fixed number of times, then returns `body`.
    struct FlakySource {
        failures: u32,
        calls: Arc<AtomicU32>,
        body: &'static str,
    }

    impl DataSource for FlakySource {
        fn name(&self) -> &str {
            "memory://flaky"
        }

        fn read(&self) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(Error::fetch(self.name(), "connection reset"))
            } else {
                Ok(self.body.to_string())
            }
        }
    }

    fn flaky(failures: u32, body: &'static str) -> (Fetcher, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let source = FlakySource {
            failures,
            calls: Arc::clone(&calls),
            body,
        };
        (Fetcher::new(Box::new(source), RetryPolicy::immediate(2)), calls)
    }

    #[test]
    fn test_policy_defaults() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.attempts(), 3);
        assert_eq!(policy.timeout, Duration::from_secs(10));
        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(1), Duration::from_secs(3));
        assert_eq!(policy.delay(2), Duration::from_secs(5));
    }

    #[test]
    fn test_first_attempt_succeeds() {
        let (fetcher, calls) = flaky(0, "Entity,Year,PM2.5\nPeru,2020,20.5\n");
        let table = fetcher.fetch().unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_recovers_after_failures() {
        let (fetcher, calls) = flaky(2, "Entity,Year,PM2.5\nPeru,2020,20.5\n");

        assert!(fetcher.fetch().is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_exhausted_returns_none() {
        let (fetcher, calls) = flaky(10, "");

        assert!(fetcher.fetch().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_file_source() {
        let path = std::env::temp_dir().join(format!("airboard-fetch-{}.csv", std::process::id()));
        std::fs::write(&path, "Entity,Code,Year,PM2.5\nChile,CHL,2019,21.3\n").unwrap();

        let fetcher = Fetcher::file(&path, RetryPolicy::immediate(0));
        let table = fetcher.fetch().unwrap();
        assert_eq!(table.cell(0, 1), Some("CHL"));
        assert_eq!(fetcher.source_name(), path.display().to_string());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let source = FileSource::new("/nonexistent/airboard/pm25.csv");
        let err = source.read().unwrap_err();

        assert!(matches!(err, Error::FileRead { .. }));
        assert!(err.is_source_error());
    }
}
