//! Time-series database HTTP client
//!
//! Speaks the database's JSON API: `POST /query_cols` for column-
//! oriented query results and `POST /insert` for row ingestion. Logged
//! rows are buffered in memory per table and sent by an explicit
//! [`DbClient::flush`]; each row gains a `timestamp` column at append
//! time so replayed histories stay ordered by ingest wall-clock.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// One buffered metric row: metric name to value, deterministic order.
pub type Row = BTreeMap<String, f64>;

/// Query request body.
#[derive(Serialize, Deserialize, Debug)]
pub struct QueryRequest {
    /// SQL query text.
    pub query: String,
}

/// Column-oriented query response.
///
/// Maps each selected column name to its ordered sequence of nullable
/// scalars. Consumed immediately by the caller and discarded.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct QueryResponse {
    /// Column name to values, in result-row order.
    pub columns: HashMap<String, Vec<Value>>,
}

/// Ingest request body: rows destined for one table.
#[derive(Serialize, Deserialize, Debug)]
pub struct InsertRequest {
    /// Target table.
    pub table: String,
    /// Rows in log order.
    pub rows: Vec<Row>,
}

/// Quote an identifier for use in a query, doubling embedded quotes.
///
/// Source-system naming conventions permit brackets and other special
/// characters in column and table names.
#[must_use]
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Build the single-column select issued by the export pipeline.
#[must_use]
pub fn select_column_query(column: &str, table: &str) -> String {
    format!("SELECT {} FROM {}", quote_ident(column), quote_ident(table))
}

/// HTTP client for the time-series database.
///
/// Owns its connection pool exclusively for the lifetime of the
/// pipeline; queries are issued synchronously from the caller's
/// perspective, logging is buffered until flushed.
pub struct DbClient {
    client: reqwest::Client,
    query_url: String,
    insert_url: String,
    // Table -> buffered rows, drained by flush.
    buffer: HashMap<String, Vec<Row>>,
}

impl DbClient {
    /// Create a client for the database at `endpoint`.
    #[must_use]
    pub fn new(endpoint: &str) -> Self {
        let endpoint = endpoint.trim_end_matches('/');
        Self {
            client: reqwest::Client::new(),
            query_url: format!("{endpoint}/query_cols"),
            insert_url: format!("{endpoint}/insert"),
            buffer: HashMap::new(),
        }
    }

    /// Issue one query and return its column-oriented result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on transport failure and [`Error::Api`]
    /// on a non-success response (e.g. unknown column or table).
    pub async fn query(&self, query: &str) -> Result<QueryResponse> {
        tracing::debug!(query, "querying database");
        let response = self
            .client
            .post(&self.query_url)
            .json(&QueryRequest {
                query: query.to_string(),
            })
            .send()
            .await?;
        let response = error_for_response(response).await?;
        Ok(response.json::<QueryResponse>().await?)
    }

    /// Select one column from `table` and return its values in order.
    ///
    /// # Errors
    ///
    /// Propagates [`DbClient::query`] errors; returns
    /// [`Error::MissingColumn`] if the response is not keyed by the
    /// requested column name.
    pub async fn select_column(&self, table: &str, column: &str) -> Result<Vec<Value>> {
        let mut result = self.query(&select_column_query(column, table)).await?;
        result
            .columns
            .remove(column)
            .ok_or_else(|| Error::MissingColumn(column.to_string()))
    }

    /// Append one metric row to the in-memory buffer for `table`.
    ///
    /// Infallible locally; nothing is sent until [`DbClient::flush`].
    /// A `timestamp` column (seconds since epoch, fractional) is added
    /// at append time.
    #[allow(clippy::cast_precision_loss)]
    pub fn log<R: IntoIterator<Item = (String, f64)>>(&mut self, table: &str, metrics: R) {
        let mut row: Row = metrics.into_iter().collect();
        row.insert(
            "timestamp".to_string(),
            chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
        );
        self.buffer.entry(table.to_string()).or_default().push(row);
    }

    /// Total number of rows currently buffered across all tables.
    #[must_use]
    pub fn buffered_rows(&self) -> usize {
        self.buffer.values().map(Vec::len).sum()
    }

    /// Send all buffered rows to the ingest endpoint and drain the
    /// buffer.
    ///
    /// One request per table. A table's rows are dropped from the buffer
    /// only once its request succeeds, so a failed flush can be retried
    /// without losing the remaining rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] or [`Error::Api`] for the first table
    /// whose ingest request fails.
    pub async fn flush(&mut self) -> Result<()> {
        let tables: Vec<String> = self.buffer.keys().cloned().collect();
        for table in tables {
            let Some(rows) = self.buffer.get(&table) else {
                continue;
            };
            if rows.is_empty() {
                self.buffer.remove(&table);
                continue;
            }
            tracing::debug!(table = %table, rows = rows.len(), "flushing buffered rows");
            let request = InsertRequest {
                table: table.clone(),
                rows: rows.clone(),
            };
            let response = self
                .client
                .post(&self.insert_url)
                .json(&request)
                .send()
                .await?;
            error_for_response(response).await?;
            self.buffer.remove(&table);
        }
        Ok(())
    }
}

/// Map non-success responses to [`Error::Api`] with the body as message.
async fn error_for_response(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let message = response.text().await.unwrap_or_default();
        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_doubles_embedded_quotes() {
        assert_eq!(quote_ident("cpu"), "\"cpu\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_select_column_query_quotes_both_identifiers() {
        assert_eq!(
            select_column_query("episode_reward[env=xor]", "avid-wildflower-3446"),
            "SELECT \"episode_reward[env=xor]\" FROM \"avid-wildflower-3446\""
        );
    }

    #[test]
    fn test_log_buffers_rows_with_timestamp() {
        let mut db = DbClient::new("http://localhost:8080");
        assert_eq!(db.buffered_rows(), 0);

        db.log("run-1", [("loss".to_string(), 0.5)]);
        db.log("run-1", [("loss".to_string(), 0.4)]);
        db.log("run-2", [("acc".to_string(), 0.9)]);

        assert_eq!(db.buffered_rows(), 3);
        let rows = &db.buffer["run-1"];
        assert_eq!(rows.len(), 2);
        assert!((rows[0]["loss"] - 0.5).abs() < f64::EPSILON);
        assert!(rows[0].contains_key("timestamp"));
        assert!(rows[0]["timestamp"] > 0.0);
    }

    #[test]
    fn test_endpoint_trailing_slash_tolerated() {
        let db = DbClient::new("http://localhost:8080/");
        assert_eq!(db.query_url, "http://localhost:8080/query_cols");
        assert_eq!(db.insert_url, "http://localhost:8080/insert");
    }
}
