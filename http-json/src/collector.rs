use crate::config::FetchConfig;
use crate::errors::{CollectorError, Result};
use crate::event::{Event, EventBuilder};
use crate::fetcher::Fetcher;
use crate::metrics_defs::{EVENTS_BUILT, FETCH_DURATION, FETCH_ERRORS};
use shared::{counter, histogram};
use std::time::{Duration, Instant};
use url::Url;

/// One configured endpoint: where to poll, how, and how to build the event.
///
/// A collector must not be polled concurrently with itself; the host awaits
/// each [`JsonCollector::fetch`] before starting the next one.
#[derive(Clone, Debug)]
pub struct JsonCollector {
    url: Url,
    timeout: Duration,
    fetcher: Fetcher,
    builder: EventBuilder,
}

impl JsonCollector {
    pub fn new(url: Url, config: FetchConfig, timeout: Duration) -> Self {
        Self::with_fetcher(url, config, timeout, Fetcher::new())
    }

    /// Like [`JsonCollector::new`], reusing an existing fetcher and its
    /// connection pool.
    pub fn with_fetcher(url: Url, config: FetchConfig, timeout: Duration, fetcher: Fetcher) -> Self {
        tracing::info!(
            url = %url,
            namespace = config.namespace(),
            method = %config.method(),
            "Created JSON collector"
        );

        JsonCollector {
            url,
            timeout,
            fetcher,
            builder: EventBuilder::new(config),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn config(&self) -> &FetchConfig {
        self.builder.config()
    }

    /// Runs one poll cycle.
    pub async fn fetch(&self) -> Result<Event> {
        let start = Instant::now();
        let result = self.fetch_inner().await;
        histogram!(FETCH_DURATION).record(start.elapsed().as_secs_f64());

        match &result {
            Ok(_) => counter!(EVENTS_BUILT).increment(1),
            Err(e) => {
                counter!(FETCH_ERRORS, "kind" => e.kind()).increment(1);
                tracing::warn!(
                    url = %self.url,
                    kind = e.kind(),
                    retryable = e.is_retryable(),
                    error = %e,
                    "Poll cycle failed"
                );
            }
        }

        result
    }

    async fn fetch_inner(&self) -> Result<Event> {
        let config = self.builder.config();
        let raw = self
            .fetcher
            .execute(&self.url, config.method(), config.body(), self.timeout)
            .await?;

        self.builder.build(raw).map_err(CollectorError::from)
    }
}
