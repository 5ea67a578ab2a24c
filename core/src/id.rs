//! Request identifiers and the unique-identifier generator.

use crate::environment::Clock;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Separator placed between the prefix, serial number and timestamp of a
/// generated identifier.
pub const ID_DELIMITER: char = '#';

/// Opaque key naming one request/response lifecycle.
///
/// Identifiers are either chosen by the caller or produced by
/// [`IdGenerator::next_id`]. A ledger never reuses one on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Create an identifier from any string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the identifier, returning the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&String> for RequestId {
    fn from(id: &String) -> Self {
        Self(id.clone())
    }
}

impl From<&RequestId> for RequestId {
    fn from(id: &RequestId) -> Self {
        id.clone()
    }
}

impl AsRef<str> for RequestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RequestId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Generator of identifiers unique within one owner.
///
/// Each call bumps a serial number and formats `{prefix}#{serial}#{millis}`,
/// where `millis` is the clock's Unix time in milliseconds. The serial number
/// alone guarantees uniqueness, so a stalled or fixed clock is harmless.
pub struct IdGenerator {
    serial: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl IdGenerator {
    /// Create a generator starting at serial number zero.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            serial: AtomicU64::new(0),
            clock,
        }
    }

    /// Produce the next identifier.
    pub fn next_id(&self, prefix: &str) -> RequestId {
        let serial = self.serial.fetch_add(1, Ordering::Relaxed) + 1;
        let millis = self.clock.now().timestamp_millis();
        RequestId(format!(
            "{prefix}{ID_DELIMITER}{serial}{ID_DELIMITER}{millis}"
        ))
    }

    /// The last serial number handed out (zero if none).
    #[must_use]
    pub fn last_serial(&self) -> u64 {
        self.serial.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdGenerator")
            .field("serial", &self.last_serial())
            .finish_non_exhaustive()
    }
}
