//! # Request Ledger Testing
//!
//! Testing utilities for the request ledger.
//!
//! This crate provides:
//! - [`StubTransport`]: scripted transport with held requests and a request log
//! - [`FixedClock`]: deterministic time for generated identifiers
//! - [`init_test_tracing`]: log output for test runs
//!
//! ## Example
//!
//! ```
//! use request_ledger_core::{Ledger, params};
//! use request_ledger_testing::StubTransport;
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = StubTransport::new();
//! transport.succeed("https://api.test/items", json!({"data": 42}));
//!
//! let ledger = Ledger::new(transport);
//! ledger.get("https://api.test/items", "x", params![]).await?;
//! assert_eq!(ledger.response("x")?, Some(json!({"data": 42})));
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use request_ledger_core::environment::Clock;

pub mod stub;

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, so generated identifiers are reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use request_ledger_testing::mocks::FixedClock;
    /// use request_ledger_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Honors `RUST_LOG`; defaults to debug output for the ledger crates. Safe to
/// call from every test, only the first call installs anything.
pub fn init_test_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "request_ledger_core=debug,request_ledger_http=debug".into());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
pub use stub::{StubError, StubGate, StubReply, StubTransport};
