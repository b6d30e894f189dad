//! Integration tests for EventBus

use screenflow_core::events::{
    EngineEvent, EventBus, LISTENER_PANICKED, PROCESS_STARTED, STATE_CHANGED,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn started(process: &str) -> EngineEvent {
    EngineEvent::ProcessStarted {
        process: process.to_string(),
    }
}

/// Test listeners fire in registration order
#[test]
fn test_listeners_fire_in_registration_order() {
    let bus = EventBus::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    for label in ["first", "second", "third"] {
        let order = order.clone();
        bus.subscribe(PROCESS_STARTED, move |_| order.lock().unwrap().push(label));
    }

    bus.publish(started("login"));

    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
}

/// Test a once-listener fires at most once
#[test]
fn test_subscribe_once_fires_at_most_once() {
    let bus = EventBus::new();
    let once_calls = Arc::new(AtomicUsize::new(0));
    let always_calls = Arc::new(AtomicUsize::new(0));

    let counter = once_calls.clone();
    bus.subscribe_once(PROCESS_STARTED, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let counter = always_calls.clone();
    bus.subscribe(PROCESS_STARTED, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    bus.publish(started("a"));
    bus.publish(started("b"));
    bus.publish(started("c"));

    assert_eq!(once_calls.load(Ordering::SeqCst), 1);
    assert_eq!(always_calls.load(Ordering::SeqCst), 3);
    assert_eq!(bus.listener_count(PROCESS_STARTED), 1);
}

/// Test a panicking listener neither stops the others nor reaches the publisher
#[test]
fn test_panicking_listener_is_isolated() {
    let bus = EventBus::new();
    let reached = Arc::new(AtomicUsize::new(0));
    let diagnostics = Arc::new(Mutex::new(Vec::new()));

    bus.subscribe(STATE_CHANGED, |_| panic!("listener exploded"));
    let counter = reached.clone();
    bus.subscribe(STATE_CHANGED, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let sink = diagnostics.clone();
    bus.subscribe(LISTENER_PANICKED, move |event| sink.lock().unwrap().push(event.clone()));

    bus.publish(EngineEvent::StateChanged {
        from: "a".into(),
        to: "b".into(),
    });

    assert_eq!(reached.load(Ordering::SeqCst), 1);
    assert_eq!(
        *diagnostics.lock().unwrap(),
        vec![EngineEvent::ListenerPanicked {
            source_event: STATE_CHANGED.into(),
            message: "listener exploded".into(),
        }]
    );
}

/// Test a panicking diagnostic listener does not recurse
#[test]
fn test_panicking_diagnostic_listener_does_not_recurse() {
    let bus = EventBus::new();
    let calls = Arc::new(AtomicUsize::new(0));

    bus.subscribe(PROCESS_STARTED, |_| panic!("first"));
    let counter = calls.clone();
    bus.subscribe(LISTENER_PANICKED, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        panic!("second");
    });

    bus.publish(started("p"));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

/// Test events without listeners are dropped silently
#[test]
fn test_publish_without_listeners() {
    let bus = EventBus::new();
    bus.publish(started("nobody-listens"));
    assert_eq!(bus.listener_count(PROCESS_STARTED), 0);
}

/// Test concurrent publishers sharing one bus
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_publish_and_subscribe() {
    let bus = Arc::new(EventBus::new());
    let delivered = Arc::new(AtomicUsize::new(0));

    let counter = delivered.clone();
    bus.subscribe(PROCESS_STARTED, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let mut handles = Vec::new();
    for task in 0..8 {
        let bus = bus.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..50 {
                bus.publish(started(&format!("run-{}-{}", task, i)));
                if i % 10 == 0 {
                    bus.subscribe(STATE_CHANGED, |_| {});
                }
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(delivered.load(Ordering::SeqCst), 400);
    assert_eq!(bus.listener_count(STATE_CHANGED), 40);
}
