//! Error types for the HTTP transport

use request_ledger_core::config::ConfigError;
use thiserror::Error;

/// Failures reported by [`HttpTransport`](crate::HttpTransport).
///
/// Every variant carries only owned strings and numbers so the ledger can keep
/// a copy for later retrieval and hand another to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    /// URL scheme is not `http` or `https`
    #[error("URL must start with http:// or https://: {0}")]
    InvalidUrl(String),

    /// Connection, TLS or protocol failure before a response arrived
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    /// Server answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, decoded lossily as UTF-8 for display
        body: String,
    },

    /// Response body exceeded the configured limit
    #[error("Response too large (>{limit} bytes)")]
    ResponseTooLarge {
        /// Configured limit in bytes
        limit: usize,
    },

    /// Response body stream broke off
    #[error("Failed to read response: {0}")]
    BodyRead(String),

    /// A configured default header is not a valid header
    #[error("Invalid header {0}")]
    InvalidHeader(String),

    /// Configuration could not be loaded
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The underlying client could not be built
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl HttpError {
    /// HTTP status code, for `Status` failures.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
