//! Error types for tsbridge

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// tsbridge error types
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport error (connection, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from a collaborator service
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the service
        status: u16,
        /// Response body or status text
        message: String,
    },

    /// Query result did not contain the requested column
    #[error("column {0:?} not present in query result")]
    MissingColumn(String),

    /// Column value that cannot be represented as a number
    #[error("non-numeric value {value} at row {index} of column {column:?}")]
    NonNumeric {
        /// Column the value came from
        column: String,
        /// Zero-based row index within the column
        index: usize,
        /// JSON rendering of the offending value
        value: String,
    },

    /// Retry budget exhausted on a transiently failing operation
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made, including the first
        attempts: u32,
        /// Message of the final error
        last: String,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is a transient transport failure worth retrying.
    ///
    /// Covers request timeouts, connection failures, HTTP 429, and HTTP
    /// 5xx responses. Everything else (bad requests, missing columns,
    /// malformed payloads) is permanent.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(err) => {
                err.is_timeout()
                    || err.is_connect()
                    || err
                        .status()
                        .is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
            }
            Self::Api { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_transience() {
        let rate_limited = Error::Api {
            status: 429,
            message: "slow down".to_string(),
        };
        assert!(rate_limited.is_transient());

        let unavailable = Error::Api {
            status: 503,
            message: "upstream down".to_string(),
        };
        assert!(unavailable.is_transient());

        let bad_request = Error::Api {
            status: 400,
            message: "no such project".to_string(),
        };
        assert!(!bad_request.is_transient());
    }

    #[test]
    fn test_permanent_errors_not_transient() {
        assert!(!Error::MissingColumn("loss".to_string()).is_transient());
        let io = Error::Io(std::io::Error::other("disk"));
        assert!(!io.is_transient());
    }

    #[test]
    fn test_retries_exhausted_display() {
        let error = Error::RetriesExhausted {
            attempts: 5,
            last: "read timeout".to_string(),
        };
        let error_str = format!("{error}");
        assert!(error_str.contains("5 attempts"));
        assert!(error_str.contains("read timeout"));
    }
}
