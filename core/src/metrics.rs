//! Metric names and descriptions.
//!
//! The ledger records through the `metrics` facade; installing a recorder or
//! exporter is left to the application.

use metrics::{describe_counter, describe_gauge};

/// Requests accepted and handed to the transport.
pub const REQUESTS_DISPATCHED: &str = "ledger.requests.dispatched";
/// Requests whose transport call succeeded.
pub const REQUESTS_SUCCEEDED: &str = "ledger.requests.succeeded";
/// Requests whose transport call failed.
pub const REQUESTS_FAILED: &str = "ledger.requests.failed";
/// Dispatch attempts rejected before reaching the transport.
pub const REQUESTS_REJECTED: &str = "ledger.requests.rejected";
/// Requests currently awaiting the transport.
pub const REQUESTS_IN_FLIGHT: &str = "ledger.requests.in_flight";
/// Outcomes consumed through `response`, `error` or `take`.
pub const OUTCOMES_RETRIEVED: &str = "ledger.outcomes.retrieved";

/// Register descriptions for every ledger metric.
pub fn register_metrics() {
    describe_counter!(
        REQUESTS_DISPATCHED,
        "Total number of requests handed to the transport"
    );
    describe_counter!(
        REQUESTS_SUCCEEDED,
        "Total number of requests that settled with a success payload"
    );
    describe_counter!(
        REQUESTS_FAILED,
        "Total number of requests that settled with a transport failure"
    );
    describe_counter!(
        REQUESTS_REJECTED,
        "Total number of dispatch attempts rejected (id in use, unbalanced parameters)"
    );
    describe_gauge!(
        REQUESTS_IN_FLIGHT,
        "Number of requests currently awaiting the transport"
    );
    describe_counter!(
        OUTCOMES_RETRIEVED,
        "Total number of stored outcomes consumed by callers"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_without_recorder() {
        // No recorder installed: descriptions go to the no-op recorder.
        register_metrics();
        assert!(REQUESTS_IN_FLIGHT.starts_with("ledger."));
    }
}
