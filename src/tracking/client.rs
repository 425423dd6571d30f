//! HTTP client for the tracking service and its lazy sequences

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

use super::HistoryRow;

/// Environment variable holding the ambient tracking-service token.
const TOKEN_ENV: &str = "TSBRIDGE_TRACKING_TOKEN";

/// One experiment execution, as enumerated by the tracking service.
///
/// The name doubles as the target table for replayed metrics and may
/// contain characters that need sanitizing before filesystem use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Run {
    /// Service-assigned identifier, used for history retrieval.
    pub id: String,
    /// Human-facing run name.
    pub name: String,
}

#[derive(Deserialize, Debug)]
struct RunsPage {
    runs: Vec<Run>,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Deserialize, Debug)]
struct HistoryPage {
    rows: Vec<HistoryRow>,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Client for the experiment-tracking service.
///
/// Authenticates with the ambient token from `TSBRIDGE_TRACKING_TOKEN`
/// when set. The request timeout is generous by default since a run's
/// full history can be a large download.
pub struct TrackingClient {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl TrackingClient {
    /// Create a client for the tracking service at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the underlying client cannot be built.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: std::env::var(TOKEN_ENV).ok(),
        })
    }

    /// Enumerate the runs of `project` whose configured name matches the
    /// regular-expression `name_filter` (evaluated server-side).
    ///
    /// Returns a lazy sequence; no network traffic happens until the
    /// first pull.
    #[must_use]
    pub fn runs(&self, project: &str, name_filter: &str) -> RunStream<'_> {
        RunStream {
            client: self,
            project: project.to_string(),
            name_filter: name_filter.to_string(),
            buffered: VecDeque::new(),
            cursor: None,
            exhausted: false,
        }
    }

    /// Retrieve the full metric history of `run` as a lazy sequence of
    /// rows in recorded order.
    #[must_use]
    pub fn history(&self, run: &Run) -> HistoryStream<'_> {
        HistoryStream {
            client: self,
            run_id: run.id.clone(),
            buffered: VecDeque::new(),
            cursor: None,
            exhausted: false,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let mut request = self
            .client
            .get(format!("{}{path}", self.endpoint))
            .query(params);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

/// Finite, forward-only sequence of [`Run`] handles.
///
/// Pages are fetched on demand; a pull that fails leaves the cursor and
/// buffer untouched, so retrying the same pull neither skips nor
/// duplicates a run.
pub struct RunStream<'a> {
    client: &'a TrackingClient,
    project: String,
    name_filter: String,
    buffered: VecDeque<Run>,
    cursor: Option<String>,
    exhausted: bool,
}

impl RunStream<'_> {
    /// Pull the next run.
    ///
    /// Returns `Ok(None)` once the sequence is exhausted; the sequence
    /// cannot be restarted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] or [`Error::Api`] if a page fetch fails.
    pub async fn try_next(&mut self) -> Result<Option<Run>> {
        loop {
            if let Some(run) = self.buffered.pop_front() {
                return Ok(Some(run));
            }
            if self.exhausted {
                return Ok(None);
            }
            let mut params = vec![
                ("project", self.project.as_str()),
                ("name_regex", self.name_filter.as_str()),
            ];
            if let Some(cursor) = &self.cursor {
                params.push(("cursor", cursor.as_str()));
            }
            let page: RunsPage = self.client.get_json("/api/v1/runs", &params).await?;
            self.buffered.extend(page.runs);
            match page.next_cursor {
                Some(cursor) => self.cursor = Some(cursor),
                None => self.exhausted = true,
            }
        }
    }
}

/// Finite, forward-only sequence of [`HistoryRow`] values for one run.
pub struct HistoryStream<'a> {
    client: &'a TrackingClient,
    run_id: String,
    buffered: VecDeque<HistoryRow>,
    cursor: Option<String>,
    exhausted: bool,
}

impl HistoryStream<'_> {
    /// Pull the next history row.
    ///
    /// Returns `Ok(None)` once the history is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] or [`Error::Api`] if a page fetch fails.
    pub async fn try_next(&mut self) -> Result<Option<HistoryRow>> {
        loop {
            if let Some(row) = self.buffered.pop_front() {
                return Ok(Some(row));
            }
            if self.exhausted {
                return Ok(None);
            }
            let path = format!("/api/v1/runs/{}/history", self.run_id);
            let mut params = Vec::new();
            if let Some(cursor) = &self.cursor {
                params.push(("cursor", cursor.as_str()));
            }
            let page: HistoryPage = self.client.get_json(&path, &params).await?;
            self.buffered.extend(page.rows);
            match page.next_cursor {
                Some(cursor) => self.cursor = Some(cursor),
                None => self.exhausted = true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trailing_slash_tolerated() {
        let client =
            TrackingClient::new("http://localhost:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.endpoint, "http://localhost:8000");
    }

    #[test]
    fn test_runs_is_lazy() {
        // Constructing the stream does no work; the first network call
        // happens on the first pull.
        let client = TrackingClient::new("http://localhost:8000", Duration::from_secs(1)).unwrap();
        let stream = client.runs("entity/project", ".*");
        assert!(stream.buffered.is_empty());
        assert!(!stream.exhausted);
    }
}
