//! HTTP transport configuration.

use request_ledger_core::config::{ConfigError, parse_number};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Environment variable holding the `User-Agent` sent with every request.
pub const USER_AGENT_VAR: &str = "REQUEST_LEDGER_HTTP_USER_AGENT";

/// Environment variable holding the response size limit in bytes.
pub const MAX_RESPONSE_BYTES_VAR: &str = "REQUEST_LEDGER_HTTP_MAX_RESPONSE_BYTES";

/// Default maximum response size (50MB)
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 50 * 1024 * 1024;

/// Settings for [`HttpTransport`](crate::HttpTransport).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// `User-Agent` header, if any
    pub user_agent: Option<String>,
    /// Responses larger than this fail with `ResponseTooLarge`
    pub max_response_bytes: usize,
    /// Headers added to every request
    pub default_headers: BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            default_headers: BTreeMap::new(),
        }
    }
}

impl HttpConfig {
    /// Load configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidNumber`] if the size limit is not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidNumber`] if the size limit is not a number.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(user_agent) = lookup(USER_AGENT_VAR) {
            config.user_agent = Some(user_agent);
        }
        if let Some(limit) = lookup(MAX_RESPONSE_BYTES_VAR) {
            config.max_response_bytes = parse_number(MAX_RESPONSE_BYTES_VAR, &limit)?;
        }
        Ok(config)
    }

    /// Set the `User-Agent`.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the response size limit.
    #[must_use]
    pub const fn with_max_response_bytes(mut self, limit: usize) -> Self {
        self.max_response_bytes = limit;
        self
    }

    /// Add a header sent with every request.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }
}
