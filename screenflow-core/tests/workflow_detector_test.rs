//! Integration tests for ScreenDetector

use async_trait::async_trait;
use screenflow_core::events::{EngineEvent, EventBus, DETECTION_TIMEOUT};
use screenflow_core::target::memory::{ElementState, InMemoryTarget};
use screenflow_core::target::{CapabilityError, TargetCapability};
use screenflow_core::workflow::{ScreenDetector, StopHandle};
use screenflow_core::{
    Condition, DetectionStrategy, EngineError, Locator, ScreenDescriptor, ScreenPredicate,
    ScreenTag,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

fn tags(names: &[&str]) -> Vec<ScreenTag> {
    names.iter().map(|name| ScreenTag::new(*name)).collect()
}

fn detector(target: &Arc<InMemoryTarget>, screens: Vec<ScreenDescriptor>) -> (ScreenDetector, Arc<EventBus>) {
    let bus = Arc::new(EventBus::new());
    let detector = ScreenDetector::new(target.clone(), screens, bus.clone())
        .with_poll_interval(Duration::from_millis(50));
    (detector, bus)
}

struct Fixed(bool);

#[async_trait]
impl ScreenPredicate for Fixed {
    async fn evaluate(&self, _target: &dyn TargetCapability) -> Result<bool, CapabilityError> {
        Ok(self.0)
    }
}

/// Test a visible and enabled screen is found on the first poll
#[tokio::test]
async fn test_visible_screen_detected_on_first_poll() {
    let target = Arc::new(InMemoryTarget::new());
    target.update_page(|page| page.show(Locator::id("login")));
    let (detector, _) = detector(&target, vec![ScreenDescriptor::visible("LOGIN", Locator::id("login"))]);
    let detector = detector.with_poll_interval(Duration::from_secs(2));

    let started = Instant::now();
    let tag = detector
        .wait_for_screen(&tags(&["LOGIN"]), Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(tag, ScreenTag::new("LOGIN"));
    assert!(started.elapsed() < Duration::from_secs(1));
    // one is_visible and one is_enabled
    assert_eq!(target.probe_count(), 2);
}

/// Test detection times out with exactly one detection_timeout event
#[tokio::test]
async fn test_detection_timeout_publishes_once() {
    let target = Arc::new(InMemoryTarget::new());
    let (detector, bus) = detector(&target, vec![ScreenDescriptor::visible("LOGIN", Locator::id("login"))]);
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    bus.subscribe(DETECTION_TIMEOUT, move |event| sink.lock().unwrap().push(event.clone()));

    let started = Instant::now();
    let result = detector
        .wait_for_screen(&tags(&["LOGIN"]), Duration::from_secs(1))
        .await;

    assert!(started.elapsed() >= Duration::from_secs(1));
    match result {
        Err(EngineError::DetectionTimeout { expected, timeout }) => {
            assert_eq!(expected, tags(&["LOGIN"]));
            assert_eq!(timeout, Duration::from_secs(1));
        }
        other => panic!("expected DetectionTimeout, got {:?}", other),
    }
    assert_eq!(
        *events.lock().unwrap(),
        vec![EngineEvent::DetectionTimeout {
            expected: tags(&["LOGIN"])
        }]
    );
}

/// Test a screen appearing mid-wait is picked up
#[tokio::test]
async fn test_screen_rendered_later_is_detected() {
    let target = Arc::new(InMemoryTarget::new());
    let (detector, _) = detector(&target, vec![ScreenDescriptor::visible("LOGIN", Locator::id("login"))]);

    let renderer = target.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        renderer.update_page(|page| page.show(Locator::id("login")));
    });

    let tag = detector
        .wait_for_screen(&tags(&["LOGIN"]), Duration::from_secs(3))
        .await
        .unwrap();
    assert_eq!(tag, ScreenTag::new("LOGIN"));
}

/// Test an unrepresentably large timeout waits without a deadline
#[tokio::test]
async fn test_unbounded_timeout_does_not_overflow() {
    let target = Arc::new(InMemoryTarget::new());
    let (detector, _) = detector(&target, vec![ScreenDescriptor::visible("LOGIN", Locator::id("login"))]);

    let renderer = target.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(120)).await;
        renderer.update_page(|page| page.show(Locator::id("login")));
    });

    let tag = detector
        .wait_for_screen(&tags(&["LOGIN"]), Duration::from_secs(u64::MAX))
        .await
        .unwrap();
    assert_eq!(tag, ScreenTag::new("LOGIN"));
}

/// Test VisibleAndEnabled rejects a disabled element
#[tokio::test]
async fn test_visible_and_enabled_requires_enabled() {
    let target = Arc::new(InMemoryTarget::new());
    target.update_page(|page| {
        page.insert(
            Locator::id("submit"),
            ElementState {
                enabled: false,
                ..ElementState::default()
            },
        )
    });
    let (detector, _) = detector(&target, vec![ScreenDescriptor::visible("SUBMIT", Locator::id("submit"))]);

    assert_eq!(detector.detect_immediate(&tags(&["SUBMIT"])).await.unwrap(), None);
}

/// Test PresenceOnly ignores visibility
#[tokio::test]
async fn test_presence_only_ignores_visibility() {
    let target = Arc::new(InMemoryTarget::new());
    target.update_page(|page| {
        page.insert(
            Locator::css(".spinner"),
            ElementState {
                visible: false,
                enabled: false,
                ..ElementState::default()
            },
        )
    });
    let (detector, _) = detector(
        &target,
        vec![
            ScreenDescriptor::present("LOADING", Locator::css(".spinner")),
            ScreenDescriptor::present("MISSING", Locator::css(".nothing")),
        ],
    );

    assert_eq!(
        detector.detect_immediate(&tags(&["MISSING", "LOADING"])).await.unwrap(),
        Some(ScreenTag::new("LOADING"))
    );
    assert_eq!(detector.detect_immediate(&tags(&["MISSING"])).await.unwrap(), None);
}

/// Test CustomPredicate ignores the locator and requires every predicate
#[tokio::test]
async fn test_custom_predicate_ignores_locator() {
    let target = Arc::new(InMemoryTarget::new());
    target.update_page(|page| page.set_script_result("return window.captchaLoaded", serde_json::json!(true)));

    let passing = ScreenDescriptor::builder("CAPTCHA", Locator::id("never-rendered"))
        .strategy(DetectionStrategy::CustomPredicate)
        .criterion(Condition::ScriptTruthy("return window.captchaLoaded".into()))
        .criterion(screenflow_core::Criterion::custom(Fixed(true)))
        .build()
        .unwrap();
    let failing = ScreenDescriptor::builder("BLOCKED", Locator::id("never-rendered"))
        .strategy(DetectionStrategy::CustomPredicate)
        .criterion(Condition::ScriptTruthy("return window.captchaLoaded".into()))
        .criterion(screenflow_core::Criterion::custom(Fixed(false)))
        .build()
        .unwrap();
    let (detector, _) = detector(&target, vec![passing, failing]);

    assert_eq!(
        detector.detect_immediate(&tags(&["BLOCKED", "CAPTCHA"])).await.unwrap(),
        Some(ScreenTag::new("CAPTCHA"))
    );
}

/// Test extra criteria are ANDed with the base check
#[tokio::test]
async fn test_criteria_are_anded_with_base_check() {
    let target = Arc::new(InMemoryTarget::new());
    target.update_page(|page| {
        page.show(Locator::id("dashboard"));
        page.show(Locator::css(".loading"));
    });
    let descriptor = ScreenDescriptor::builder("DASHBOARD", Locator::id("dashboard"))
        .criterion(Condition::Absent(Locator::css(".loading")))
        .build()
        .unwrap();
    let (detector, _) = detector(&target, vec![descriptor]);

    assert_eq!(detector.detect_immediate(&tags(&["DASHBOARD"])).await.unwrap(), None);

    target.update_page(|page| page.remove(&Locator::css(".loading")));
    assert_eq!(
        detector.detect_immediate(&tags(&["DASHBOARD"])).await.unwrap(),
        Some(ScreenTag::new("DASHBOARD"))
    );
}

/// Test a global interrupt wins over a present expected screen
#[tokio::test]
async fn test_interrupt_wins_over_expected_screen() {
    let target = Arc::new(InMemoryTarget::new());
    target.update_page(|page| {
        page.show(Locator::id("username"));
        page.show(Locator::id("cookie-banner"));
    });
    let (detector, _) = detector(
        &target,
        vec![
            ScreenDescriptor::visible("USERNAME", Locator::id("username")),
            ScreenDescriptor::visible("COOKIES", Locator::id("cookie-banner")),
        ],
    );
    let detector = detector.with_interrupts(tags(&["COOKIES"]));

    let tag = detector
        .wait_for_screen(&tags(&["USERNAME"]), Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(tag, ScreenTag::new("COOKIES"));
}

/// Test ordinary capability errors count as not detected
#[tokio::test]
async fn test_capability_error_reads_as_absent() {
    let target = Arc::new(InMemoryTarget::new());
    target.update_page(|page| {
        page.show(Locator::id("flaky"));
        page.show(Locator::id("stable"));
    });
    target.fail_on(Locator::id("flaky"), CapabilityError::Other("stale element".into()));
    let (detector, _) = detector(
        &target,
        vec![
            ScreenDescriptor::visible("FLAKY", Locator::id("flaky")),
            ScreenDescriptor::visible("STABLE", Locator::id("stable")),
        ],
    );

    assert_eq!(
        detector.detect_immediate(&tags(&["FLAKY", "STABLE"])).await.unwrap(),
        Some(ScreenTag::new("STABLE"))
    );
}

/// Test a lost session aborts detection
#[tokio::test]
async fn test_lost_session_is_fatal() {
    let target = Arc::new(InMemoryTarget::new());
    target.lose_session("browser crashed");
    let (detector, _) = detector(&target, vec![ScreenDescriptor::visible("LOGIN", Locator::id("login"))]);

    let result = detector
        .wait_for_screen(&tags(&["LOGIN"]), Duration::from_secs(5))
        .await;
    assert!(matches!(
        result,
        Err(EngineError::CapabilityFatal(CapabilityError::SessionLost(_)))
    ));
}

/// Test a raised stop handle interrupts the wait
#[tokio::test]
async fn test_stop_handle_interrupts_wait() {
    let target = Arc::new(InMemoryTarget::new());
    let stop = StopHandle::new();
    let (detector, _) = detector(&target, vec![ScreenDescriptor::visible("LOGIN", Locator::id("login"))]);
    let detector = detector.with_stop_handle(stop.clone());

    let stopper = stop.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(120)).await;
        stopper.raise();
    });

    let started = Instant::now();
    let result = detector
        .wait_for_screen(&tags(&["LOGIN"]), Duration::from_secs(10))
        .await;
    assert!(matches!(result, Err(EngineError::StoppedByCaller)));
    assert!(started.elapsed() < Duration::from_secs(2));
}

/// Test an undescribed candidate is a configuration error
#[tokio::test]
async fn test_unknown_screen_tag() {
    let target = Arc::new(InMemoryTarget::new());
    let (detector, _) = detector(&target, Vec::new());

    let result = detector.detect_immediate(&tags(&["GHOST"])).await;
    assert!(matches!(result, Err(EngineError::UnknownScreen(tag)) if tag.as_str() == "GHOST"));
}
