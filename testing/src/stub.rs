//! Scripted transport for ledger tests.
//!
//! Replies are keyed by URL. A URL can also be *held*: requests to it park
//! until the test releases them, which makes the in-flight window observable.

use request_ledger_core::transport::{Transport, TransportRequest};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::Notify;

/// Failure value produced by [`StubTransport`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct StubError(pub String);

/// Scripted reply for one URL.
#[derive(Debug, Clone, PartialEq)]
pub enum StubReply {
    /// Resolve with this payload
    Succeed(Value),
    /// Resolve with this failure
    Fail(StubError),
}

/// Handle releasing requests parked on a held URL.
#[derive(Debug, Clone)]
pub struct StubGate {
    notify: Arc<Notify>,
}

impl StubGate {
    /// Let one parked (or the next) request through.
    pub fn release(&self) {
        self.notify.notify_one();
    }
}

#[derive(Debug, Default)]
struct StubState {
    replies: HashMap<String, StubReply>,
    gates: HashMap<String, Arc<Notify>>,
    requests: Vec<TransportRequest>,
}

/// In-memory transport with scripted replies.
///
/// Unscripted URLs fail with `"no stub for {METHOD} {url}"`. Clones share the
/// same script and request log.
#[derive(Debug, Clone, Default)]
pub struct StubTransport {
    state: Arc<Mutex<StubState>>,
}

impl StubTransport {
    /// Create a transport with no scripted replies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StubState> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Script `url` to succeed with `payload`.
    pub fn succeed(&self, url: impl Into<String>, payload: Value) {
        self.reply(url, StubReply::Succeed(payload));
    }

    /// Script `url` to fail with `message`.
    pub fn fail(&self, url: impl Into<String>, message: impl Into<String>) {
        self.reply(url, StubReply::Fail(StubError(message.into())));
    }

    /// Script `url` with an explicit reply, replacing any previous one.
    pub fn reply(&self, url: impl Into<String>, reply: StubReply) {
        self.state().replies.insert(url.into(), reply);
    }

    /// Park every request to `url` until released through the returned gate.
    ///
    /// Each [`StubGate::release`] lets exactly one request through. The reply
    /// is looked up after release, so it can be scripted while requests wait.
    pub fn hold(&self, url: impl Into<String>) -> StubGate {
        let notify = Arc::clone(self.state().gates.entry(url.into()).or_default());
        StubGate { notify }
    }

    /// Every request received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.state().requests.clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.state().requests.len()
    }
}

impl Transport for StubTransport {
    type Response = Value;
    type Error = StubError;

    async fn send(&self, request: TransportRequest) -> Result<Value, StubError> {
        let gate = {
            let mut state = self.state();
            state.requests.push(request.clone());
            state.gates.get(&request.url).cloned()
        };

        if let Some(gate) = gate {
            gate.notified().await;
        }

        let reply = self.state().replies.get(&request.url).cloned();
        match reply {
            Some(StubReply::Succeed(payload)) => Ok(payload),
            Some(StubReply::Fail(error)) => Err(error),
            None => Err(StubError(format!(
                "no stub for {} {}",
                request.method, request.url
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use request_ledger_core::{Method, Params};
    use serde_json::json;

    fn request(url: &str) -> TransportRequest {
        TransportRequest {
            method: Method::Get,
            url: url.to_string(),
            body: None,
            params: Params::new(),
        }
    }

    #[tokio::test]
    async fn test_scripted_replies() {
        let stub = StubTransport::new();
        stub.succeed("/ok", json!({"data": 42}));
        stub.fail("/bad", "boom");

        assert_eq!(stub.send(request("/ok")).await, Ok(json!({"data": 42})));
        assert_eq!(
            stub.send(request("/bad")).await,
            Err(StubError("boom".to_string()))
        );
        assert_eq!(
            stub.send(request("/missing")).await,
            Err(StubError("no stub for GET /missing".to_string()))
        );
        assert_eq!(stub.request_count(), 3);
    }

    #[tokio::test]
    async fn test_held_request_waits_for_release() {
        let stub = StubTransport::new();
        let gate = stub.hold("/slow");

        let task = tokio::spawn({
            let stub = stub.clone();
            async move { stub.send(request("/slow")).await }
        });

        tokio::task::yield_now().await;
        assert!(!task.is_finished());

        stub.succeed("/slow", json!("done"));
        gate.release();
        let result = task.await.map_err(|e| e.to_string());
        assert_eq!(result, Ok(Ok(json!("done"))));
    }
}
