//! The transport seam.
//!
//! The ledger never touches the network itself. It hands a
//! [`TransportRequest`] to a [`Transport`] and records whatever comes back.
//!
//! # Implementations
//!
//! - `HttpTransport` (in `request-ledger-http`): reqwest-backed production transport
//! - `StubTransport` (in `request-ledger-testing`): scripted replies for tests

use crate::params::Params;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

/// HTTP method of a ledger request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl Method {
    /// Uppercase method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Whether the verb adapters pass a body for this method.
    #[must_use]
    pub const fn takes_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a transport needs to perform one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportRequest {
    /// HTTP method
    pub method: Method,
    /// Target URL
    pub url: String,
    /// JSON body, if any
    pub body: Option<serde_json::Value>,
    /// Normalized query parameters
    pub params: Params,
}

/// Performs requests on behalf of a ledger.
///
/// A single two-outcome asynchronous operation: the future resolves to either a
/// success payload or a failure value. Both are stored by the ledger, so the
/// error type must be `Clone` (it may be returned to the dispatcher and kept for
/// [`Ledger::error`](crate::Ledger::error) at the same time).
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; one transport serves every request a
/// ledger has in flight.
pub trait Transport: Send + Sync + 'static {
    /// Success payload
    type Response: Send + 'static;

    /// Failure value
    type Error: std::error::Error + Clone + Send + Sync + 'static;

    /// Perform the request.
    fn send(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names() {
        assert_eq!(Method::Patch.to_string(), "PATCH");
        assert_eq!(
            serde_json::to_value(Method::Delete).ok(),
            Some(serde_json::json!("DELETE"))
        );
        assert!(Method::Put.takes_body());
        assert!(!Method::Get.takes_body());
    }
}
