//! Tests for WorkflowRegistry

use screenflow_core::workflow::{NamedState, Workflow, WorkflowRegistry};
use screenflow_core::{
    CommandSequence, EngineError, ExecutionContext, Locator, RunOutcome, ScreenDescriptor,
};

fn simple_workflow(name: &str) -> Result<Workflow, EngineError> {
    Workflow::builder(name)
        .initial_state(|| NamedState::new("start").expecting(["HOME"]))
        .screen(ScreenDescriptor::visible("HOME", Locator::id("home")))
        .handler("HOME", |_: &mut ExecutionContext| {
            CommandSequence::empty().then(NamedState::new("done"))
        })
        .terminal("done", RunOutcome::Success)
        .build()
}

/// Test register, list, exists and create
#[test]
fn test_register_and_create() {
    let registry = WorkflowRegistry::new();
    registry.register("upload", || simple_workflow("upload")).unwrap();
    registry.register("login", || simple_workflow("login")).unwrap();

    assert_eq!(registry.list(), vec!["login".to_string(), "upload".to_string()]);
    assert!(registry.exists("login"));
    assert_eq!(registry.len(), 2);

    let first = registry.create("login").unwrap();
    let second = registry.create("login").unwrap();
    assert_eq!(first.name(), "login");
    assert_eq!(second.initial_state().name(), "start");
}

/// Test get returns the factory itself
#[test]
fn test_get_factory() {
    let registry = WorkflowRegistry::new();
    registry.register("login", || simple_workflow("login")).unwrap();

    let factory = registry.get("login").unwrap();
    assert_eq!(factory().unwrap().name(), "login");
    assert!(registry.get("missing").is_none());
}

/// Test unknown workflows and failing factories
#[test]
fn test_create_errors() {
    let registry = WorkflowRegistry::new();
    registry.register("broken", || simple_workflow("")).unwrap();

    assert!(matches!(
        registry.create("missing"),
        Err(EngineError::UnknownWorkflow(ref name)) if name == "missing"
    ));
    assert!(matches!(
        registry.create("broken"),
        Err(EngineError::InvalidWorkflow { .. })
    ));
}

/// Test unregister and clear
#[test]
fn test_unregister_and_clear() {
    let registry = WorkflowRegistry::new();
    registry.register("a", || simple_workflow("a")).unwrap();
    registry.register("b", || simple_workflow("b")).unwrap();

    assert!(registry.unregister("a"));
    assert!(!registry.unregister("a"));
    assert_eq!(registry.list(), vec!["b".to_string()]);

    registry.clear();
    assert!(registry.is_empty());
}

/// Test a taken name is rejected unless replaced explicitly
#[test]
fn test_duplicate_names() {
    let registry = WorkflowRegistry::new();
    registry.register("login", || simple_workflow("login")).unwrap();

    assert!(matches!(
        registry.register("login", || simple_workflow("login-v2")),
        Err(EngineError::WorkflowAlreadyRegistered(ref name)) if name == "login"
    ));
    assert_eq!(registry.create("login").unwrap().name(), "login");

    assert!(registry.replace("login", || simple_workflow("login-v2")));
    assert_eq!(registry.create("login").unwrap().name(), "login-v2");
    assert!(!registry.replace("upload", || simple_workflow("upload")));
    assert_eq!(registry.len(), 2);
}
