//! Integration tests for the request ledger lifecycle
//!
//! These drive a `Ledger` over the scripted `StubTransport`, including held
//! requests so the in-flight window can be observed.

#![allow(clippy::panic)] // Test code

use request_ledger_core::{
    Ledger, LedgerError, Method, OptionsPatch, RequestId, RequestStatus, params,
};
use request_ledger_testing::{StubError, StubTransport, init_test_tracing, test_clock};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const ITEMS: &str = "https://api.test/items";
const ORDERS: &str = "https://api.test/orders";

fn invalid(id: &str) -> LedgerError<StubError> {
    LedgerError::InvalidRequest(RequestId::from(id))
}

async fn wait_until_settled(ledger: &Ledger<StubTransport>, id: &str) {
    for _ in 0..200 {
        if ledger.status(id) != RequestStatus::InFlight {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("{id} never settled");
}

#[tokio::test]
async fn test_get_success_delivered_exactly_once() {
    init_test_tracing();
    let transport = StubTransport::new();
    transport.succeed(ITEMS, json!({"data": 42}));
    let ledger = Ledger::new(transport);

    assert_eq!(ledger.get(ITEMS, "x", params![]).await, Ok(()));
    assert_eq!(ledger.response("x"), Ok(Some(json!({"data": 42}))));
    assert_eq!(ledger.response("x"), Err(invalid("x")));
    assert_eq!(ledger.error("x"), Err(invalid("x")));
}

#[tokio::test]
async fn test_failing_post_rethrows_and_records() {
    init_test_tracing();
    let transport = StubTransport::new();
    transport.fail(ORDERS, "boom");
    let ledger = Ledger::new(transport.clone());
    ledger.set_options(Some(OptionsPatch::default().throw_on_failure(true)));

    let result = ledger
        .post(ORDERS, "y", json!({"n": 1}), params!["q", "v"])
        .await;
    let Err(err) = result else {
        panic!("dispatch should fail");
    };
    assert_eq!(err.to_string(), "boom");

    assert_eq!(ledger.error("y"), Ok(Some(StubError("boom".to_string()))));
    assert_eq!(ledger.error("y"), Err(invalid("y")));

    let sent = transport.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, Method::Post);
    assert_eq!(sent[0].body, Some(json!({"n": 1})));
    assert_eq!(sent[0].params.get("q"), Some("v"));
}

#[tokio::test]
async fn test_cross_consumption_response_first() {
    let transport = StubTransport::new();
    transport.fail(ORDERS, "boom");
    let ledger = Ledger::new(transport);
    ledger.set_options(Some(OptionsPatch::default().throw_on_failure(false)));

    assert_eq!(ledger.get(ORDERS, "z", params![]).await, Ok(()));

    assert_eq!(ledger.response("z"), Ok(None));
    assert_eq!(ledger.status("z"), RequestStatus::Completed);
    assert_eq!(ledger.error("z"), Ok(Some(StubError("boom".to_string()))));
    assert_eq!(ledger.status("z"), RequestStatus::Absent);
    assert_eq!(ledger.response("z"), Err(invalid("z")));
}

#[tokio::test]
async fn test_cross_consumption_error_first() {
    let transport = StubTransport::new();
    transport.fail(ORDERS, "boom");
    let ledger = Ledger::new(transport);
    ledger.set_options(Some(OptionsPatch::default().throw_on_failure(false)));

    assert_eq!(ledger.get(ORDERS, "z", params![]).await, Ok(()));

    assert_eq!(ledger.error("z"), Ok(Some(StubError("boom".to_string()))));
    assert_eq!(ledger.response("z"), Err(invalid("z")));
}

#[tokio::test]
async fn test_success_error_side_is_empty_and_keeps_entry() {
    let transport = StubTransport::new();
    transport.succeed(ITEMS, json!([1, 2, 3]));
    let ledger = Ledger::new(transport);

    assert_eq!(ledger.patch(ITEMS, "p", json!({"a": 1}), params![]).await, Ok(()));
    assert_eq!(ledger.error("p"), Ok(None));
    assert_eq!(ledger.response("p"), Ok(Some(json!([1, 2, 3]))));
}

#[tokio::test]
async fn test_in_flight_window() {
    init_test_tracing();
    let transport = StubTransport::new();
    let gate = transport.hold(ITEMS);
    transport.succeed(ITEMS, json!("late"));
    let ledger = Ledger::new(transport);

    let completion = ledger.dispatch(Method::Get, ITEMS, "slow", None, params![]);
    let Ok(completion) = completion else {
        panic!("dispatch rejected");
    };
    let handle = tokio::spawn(completion);
    tokio::task::yield_now().await;

    assert_eq!(ledger.status("slow"), RequestStatus::InFlight);
    assert_eq!(
        ledger.response("slow"),
        Err(LedgerError::RequestNotComplete(RequestId::from("slow")))
    );
    assert_eq!(
        ledger.get(ITEMS, "slow", params![]).await,
        Err(LedgerError::IdInUse(RequestId::from("slow")))
    );
    assert_eq!(ledger.response("never"), Err(invalid("never")));

    gate.release();
    let settled = handle.await.map_err(|e| e.to_string());
    assert_eq!(settled, Ok(Ok(())));
    assert_eq!(ledger.response("slow"), Ok(Some(json!("late"))));
}

#[tokio::test]
async fn test_verbs_map_to_methods() {
    let transport = StubTransport::new();
    transport.succeed(ITEMS, json!(null));
    let ledger = Ledger::new(transport.clone());

    tokio_test::assert_ok!(ledger.get(ITEMS, "1", params![]).await);
    tokio_test::assert_ok!(ledger.delete(ITEMS, "2", params![]).await);
    tokio_test::assert_ok!(ledger.post(ITEMS, "3", json!(1), params![]).await);
    tokio_test::assert_ok!(ledger.patch(ITEMS, "4", json!(2), params![]).await);
    tokio_test::assert_ok!(ledger.put(ITEMS, "5", json!(3), params![]).await);
    tokio_test::assert_ok!(ledger.push(ITEMS, "6", json!(4), params![]).await);

    let methods: Vec<Method> = transport.requests().iter().map(|r| r.method).collect();
    assert_eq!(
        methods,
        vec![
            Method::Get,
            Method::Delete,
            Method::Post,
            Method::Patch,
            Method::Put,
            Method::Put
        ]
    );
    let bodies: Vec<bool> = transport
        .requests()
        .iter()
        .map(|r| r.body.is_some())
        .collect();
    assert_eq!(bodies, vec![false, false, true, true, true, true]);
}

#[tokio::test]
async fn test_unbalanced_params_never_reach_transport() {
    let transport = StubTransport::new();
    transport.succeed(ITEMS, json!(1));
    let ledger = Ledger::new(transport.clone());

    assert_eq!(
        ledger.get(ITEMS, "x", params!["a", 1, "b"]).await,
        Err(LedgerError::UnbalancedParameters { count: 3 })
    );
    assert_eq!(transport.request_count(), 0);
    assert_eq!(ledger.status("x"), RequestStatus::Absent);
}

#[tokio::test]
async fn test_concurrent_same_id_only_one_registers() {
    let transport = StubTransport::new();
    let gate = transport.hold(ITEMS);
    transport.succeed(ITEMS, json!("ok"));
    let ledger = Ledger::new(transport.clone());

    let attempts: Vec<_> = (0..16)
        .map(|_| {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                ledger
                    .dispatch(Method::Get, ITEMS, "shared", None, params![])
                    .map(tokio::spawn)
            })
        })
        .collect();

    let mut accepted = Vec::new();
    let mut rejected = 0;
    for attempt in attempts {
        match attempt.await {
            Ok(Ok(handle)) => accepted.push(handle),
            Ok(Err(LedgerError::IdInUse(_))) => rejected += 1,
            Ok(Err(other)) => panic!("unexpected error: {other}"),
            Err(join) => panic!("task panicked: {join}"),
        }
    }
    assert_eq!(accepted.len(), 1);
    assert_eq!(rejected, 15);

    gate.release();
    for handle in accepted {
        assert!(matches!(handle.await, Ok(Ok(()))));
    }
    assert_eq!(ledger.response("shared"), Ok(Some(json!("ok"))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_distinct_requests_in_parallel() {
    let transport = StubTransport::new();
    transport.succeed(ITEMS, json!("ok"));
    let ledger = Ledger::with_clock(transport, Arc::new(test_clock()));

    let ids: Vec<RequestId> = (0..100).map(|_| ledger.create_unique_id("batch")).collect();
    let handles: Vec<_> = ids
        .iter()
        .map(|id| {
            let ledger = ledger.clone();
            let id = id.clone();
            tokio::spawn(async move { ledger.get(ITEMS, id, params!["page", 1]).await })
        })
        .collect();

    for handle in handles {
        assert!(matches!(handle.await, Ok(Ok(()))));
    }
    assert_eq!(ledger.in_flight(), 0);
    assert_eq!(ledger.completed(), 100);

    for id in &ids {
        assert_eq!(ledger.response(id), Ok(Some(json!("ok"))));
    }
    assert_eq!(ledger.completed(), 0);
}

#[test]
fn test_ten_thousand_unique_ids() {
    let ledger = Ledger::with_clock(StubTransport::new(), Arc::new(test_clock()));
    let ids: HashSet<RequestId> = (0..10_000)
        .map(|i| ledger.create_unique_id(["", "a", "b#"][i % 3]))
        .collect();
    assert_eq!(ids.len(), 10_000);
    assert_eq!(
        ledger.create_unique_id("req").as_str(),
        "req#10001#1735689600000"
    );
}

#[test]
fn test_options_reset_restores_default() {
    let ledger = Ledger::new(StubTransport::new());
    ledger.set_options(Some(OptionsPatch::default().throw_on_failure(false)));
    assert!(!ledger.options().throw_on_failure);

    let options = ledger.set_options(Some(OptionsPatch::reset()));
    assert!(options.throw_on_failure);
}

#[tokio::test]
async fn test_independent_ledgers_have_independent_namespaces() {
    let first_transport = StubTransport::new();
    let second_transport = StubTransport::new();
    let first_gate = first_transport.hold(ITEMS);
    let second_gate = second_transport.hold(ITEMS);
    first_transport.succeed(ITEMS, json!("first"));
    second_transport.succeed(ITEMS, json!("second"));
    let first = Ledger::new(first_transport);
    let second = Ledger::new(second_transport);

    let first_pending = first.dispatch(Method::Get, ITEMS, "x", None, params![]);
    let second_pending = second.dispatch(Method::Get, ITEMS, "x", None, params![]);
    let (Ok(first_pending), Ok(second_pending)) = (first_pending, second_pending) else {
        panic!("the same id should be free in each ledger");
    };
    assert_eq!(first.status("x"), RequestStatus::InFlight);
    assert_eq!(second.status("x"), RequestStatus::InFlight);

    second_gate.release();
    assert_eq!(second_pending.await, Ok(()));
    assert_eq!(first.status("x"), RequestStatus::InFlight);
    assert_eq!(second.response("x"), Ok(Some(json!("second"))));

    first_gate.release();
    assert_eq!(first_pending.await, Ok(()));
    assert_eq!(first.response("x"), Ok(Some(json!("first"))));
}

#[tokio::test]
async fn test_caller_timeout_does_not_cancel_request() {
    init_test_tracing();
    let transport = StubTransport::new();
    let gate = transport.hold(ITEMS);
    let ledger = Ledger::new(transport.clone());

    let waited = tokio::time::timeout(
        Duration::from_millis(10),
        ledger.get(ITEMS, "t", params!["page", 1]),
    )
    .await;
    assert!(waited.is_err(), "held request should outlast the timeout");
    assert_eq!(transport.request_count(), 1);
    assert_eq!(ledger.status("t"), RequestStatus::InFlight);
    assert_eq!(
        ledger.get(ITEMS, "t", params![]).await,
        Err(LedgerError::IdInUse(RequestId::from("t")))
    );

    transport.succeed(ITEMS, json!({"data": 42}));
    gate.release();
    wait_until_settled(&ledger, "t").await;

    assert_eq!(ledger.response("t"), Ok(Some(json!({"data": 42}))));
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_detached_failure_is_still_recorded() {
    let transport = StubTransport::new();
    transport.fail(ORDERS, "boom");
    let ledger = Ledger::new(transport.clone());

    let completion = ledger.dispatch(Method::Post, ORDERS, "a", Some(json!(1)), params![]);
    assert!(completion.is_ok());
    drop(completion);

    wait_until_settled(&ledger, "a").await;
    assert_eq!(transport.request_count(), 1);
    assert_eq!(ledger.error("a"), Ok(Some(StubError("boom".to_string()))));
}
