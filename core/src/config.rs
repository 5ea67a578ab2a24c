//! Environment-based configuration for the ledger.
//!
//! # Example
//!
//! ```no_run
//! use request_ledger_core::config::LedgerConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Reads REQUEST_LEDGER_THROW_ON_FAILURE (defaults to true)
//! let config = LedgerConfig::from_env()?;
//! println!("throw on failure: {}", config.options.throw_on_failure);
//! # Ok(())
//! # }
//! ```

use crate::options::LedgerOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the initial `throw_on_failure` option.
pub const THROW_ON_FAILURE_VAR: &str = "REQUEST_LEDGER_THROW_ON_FAILURE";

/// Configuration error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set to something that is not a boolean.
    #[error("Invalid boolean for {var}: {value}")]
    InvalidBool {
        /// Variable name
        var: String,
        /// Offending value
        value: String,
    },

    /// A variable was set to something that is not a number.
    #[error("Invalid number for {var}: {value}")]
    InvalidNumber {
        /// Variable name
        var: String,
        /// Offending value
        value: String,
    },
}

/// Startup configuration for a [`Ledger`](crate::Ledger).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Options the ledger starts with
    pub options: LedgerOptions,
}

impl LedgerConfig {
    /// Load configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBool`] if a boolean variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBool`] if a boolean variable cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = lookup(THROW_ON_FAILURE_VAR) {
            config.options.throw_on_failure = parse_bool(THROW_ON_FAILURE_VAR, &value)?;
        }
        Ok(config)
    }
}

/// Parse a boolean environment value (`true/false`, `1/0`, `yes/no`, `on/off`).
///
/// # Errors
///
/// Returns [`ConfigError::InvalidBool`] for anything else.
pub fn parse_bool(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var: var.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Parse a numeric environment value.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidNumber`] if the value is not a valid number.
pub fn parse_number<T: std::str::FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber {
            var: var.to_string(),
            value: value.to_string(),
        })
}
