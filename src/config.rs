//! Pipeline configuration
//!
//! Every knob the original one-shot tools compiled in (endpoints, source
//! table, project, run-name filter) is an explicit option here. Defaults
//! match the historical constants so an unconfigured invocation behaves
//! like the original tools.

use std::time::Duration;

/// Configuration for the column-export pipeline.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Base URL of the time-series database HTTP endpoint.
    pub endpoint: String,
    /// Source table to select the column from.
    pub table: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_string(),
            table: "avid-wildflower-3446".to_string(),
        }
    }
}

/// Configuration for the metrics-import pipeline.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Base URL of the experiment-tracking service.
    pub tracking_endpoint: String,
    /// Base URL of the time-series database HTTP endpoint.
    pub db_endpoint: String,
    /// Tracking-service project whose runs are imported.
    pub project: String,
    /// Regular-expression pattern matched against run configuration
    /// names, evaluated server-side.
    pub name_filter: String,
    /// Request timeout for the tracking client. Generous, since a run's
    /// full history can be a large download.
    pub timeout: Duration,
    /// Retry policy for transient failures while enumerating runs.
    pub retry: RetryPolicy,
    /// Flush the ingest buffer once this many rows are queued.
    pub flush_rows: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            tracking_endpoint: "http://localhost:8000".to_string(),
            db_endpoint: "http://localhost:8080".to_string(),
            project: "entity-neural-network/enn-ppo".to_string(),
            name_filter: "220511-055353-.*".to_string(),
            timeout: Duration::from_secs(300),
            retry: RetryPolicy::default(),
            flush_rows: 4096,
        }
    }
}

/// Bounded exponential-backoff retry policy.
///
/// Replaces the unbounded retry-by-continue loop of the original import
/// tool. Exceeding `max_attempts` surfaces
/// [`Error::RetriesExhausted`](crate::Error::RetriesExhausted).
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts allowed, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on the delay between retries.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay preceding the given retry.
    ///
    /// `retry` is zero-based: the delay before the first retry is
    /// `initial_backoff`, doubling thereafter, capped at `max_backoff`.
    #[must_use]
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 1_u32.checked_shl(retry).unwrap_or(u32::MAX);
        let delay = self.initial_backoff.saturating_mul(factor);
        delay.min(self.max_backoff)
    }
}
