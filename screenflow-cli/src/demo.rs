//! Bundled login workflow and the simulated page it runs against

use async_trait::async_trait;
use screenflow_core::target::memory::InMemoryTarget;
use screenflow_core::target::{CapabilityError, TargetCapability};
use screenflow_core::workflow::{
    CommandExtension, LogicalState, NamedState, Workflow, WorkflowRegistry,
};
use screenflow_core::{
    Command, CommandSequence, Condition, EngineError, ExecutionContext, Locator, RunOutcome,
    ScreenDescriptor,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

pub const LOGIN_WORKFLOW: &str = "login";

const LOGIN_URL: &str = "https://app.example.com/login";
const DEMO_USERNAME: &str = "demo";
const DEMO_PASSWORD: &str = "correct-horse";

fn enter_username() -> NamedState {
    NamedState::new("enter_username").expecting(["USERNAME"])
}

fn enter_password() -> NamedState {
    NamedState::new("enter_password").expecting(["PASSWORD"])
}

fn verify_login() -> NamedState {
    NamedState::new("verify_login")
        .expecting(["DASHBOARD", "LOGIN_ERROR"])
        .on_timeout(|| Box::new(NamedState::new("retry_later")) as Box<dyn LogicalState>)
}

/// Register every bundled workflow
pub fn register(registry: &WorkflowRegistry) -> Result<(), EngineError> {
    registry.register(LOGIN_WORKFLOW, login_workflow)
}

/// Username, then password, then dashboard or error; a cookie banner may
/// interrupt at any point.
pub fn login_workflow() -> Result<Workflow, EngineError> {
    Workflow::builder(LOGIN_WORKFLOW)
        .initial_state(enter_username)
        .state(enter_password())
        .state(verify_login())
        .screen(
            ScreenDescriptor::builder("USERNAME", Locator::id("username"))
                .label("Username form")
                .build()?,
        )
        .screen(
            ScreenDescriptor::builder("PASSWORD", Locator::css("input[type=password]"))
                .label("Password form")
                .build()?,
        )
        .screen(
            ScreenDescriptor::builder("DASHBOARD", Locator::id("dashboard"))
                .label("Dashboard")
                .criterion(Condition::Absent(Locator::css(".spinner")))
                .build()?,
        )
        .screen(ScreenDescriptor::present(
            "LOGIN_ERROR",
            Locator::css(".login-error"),
        ))
        .screen(ScreenDescriptor::visible("COOKIES", Locator::id("cookie-banner")))
        .handler("USERNAME", |ctx: &mut ExecutionContext| {
            let username = ctx.credential("username").unwrap_or_default().to_string();
            CommandSequence::new(vec![
                Command::clear(Locator::id("username")),
                Command::type_text(Locator::id("username"), username)
                    .with_message("Entering username"),
                Command::click(Locator::id("next")),
            ])
            .then(enter_password())
        })
        .handler("PASSWORD", |ctx: &mut ExecutionContext| {
            let password = ctx.credential("password").unwrap_or_default().to_string();
            CommandSequence::new(vec![
                Command::type_text(Locator::css("input[type=password]"), password)
                    .with_message("Entering password"),
                Command::click(Locator::id("submit")),
                Command::wait_for(
                    Condition::Absent(Locator::css(".spinner")),
                    Duration::from_secs(2),
                ),
            ])
            .then(verify_login())
        })
        .handler("DASHBOARD", |_: &mut ExecutionContext| {
            CommandSequence::empty()
                .on_success(|ctx: &mut ExecutionContext| ctx.set_scratch("logged_in", json!(true)))
                .then(NamedState::new("logged_in"))
        })
        .handler("LOGIN_ERROR", |_: &mut ExecutionContext| {
            CommandSequence::empty().then(NamedState::new("login_failed"))
        })
        .handler("COOKIES", |_: &mut ExecutionContext| {
            CommandSequence::new(vec![Command::custom(
                "dismiss_banner",
                json!({ "button": "accept-cookies" }),
            )
            .with_message("Dismissing cookie banner")])
        })
        .interrupt("COOKIES")
        .terminal("logged_in", RunOutcome::Success)
        .terminal("login_failed", RunOutcome::Failure)
        .terminal("retry_later", RunOutcome::Retry)
        .build()
}

/// Credentials for a run; `fail_password` submits a wrong password
pub fn context(fail_password: bool) -> ExecutionContext {
    let password = if fail_password { "wrong-password" } else { DEMO_PASSWORD };
    ExecutionContext::new()
        .with_credential("username", DEMO_USERNAME)
        .with_credential("password", password)
        .with_data("login_url", json!(LOGIN_URL))
}

/// Login page that shows a cookie banner first and reveals each form step
/// after the previous one is submitted.
pub fn simulated_page() -> Arc<InMemoryTarget> {
    let target = Arc::new(InMemoryTarget::new());
    target.update_page(|page| {
        page.show(Locator::id("cookie-banner"));
        page.show(Locator::id("accept-cookies"));
        page.show(Locator::id("username"));
        page.show(Locator::id("next"));
    });
    target.on_click(Locator::id("accept-cookies"), |page| {
        page.remove(&Locator::id("cookie-banner"));
        page.remove(&Locator::id("accept-cookies"));
    });
    target.on_click(Locator::id("next"), |page| {
        page.remove(&Locator::id("username"));
        page.remove(&Locator::id("next"));
        page.show(Locator::css("input[type=password]"));
        page.show(Locator::id("submit"));
    });
    target.on_click(Locator::id("submit"), |page| {
        let accepted = page
            .element(&Locator::css("input[type=password]"))
            .map(|element| element.value == DEMO_PASSWORD)
            .unwrap_or(false);
        page.clear_elements();
        if accepted {
            page.show(Locator::id("dashboard"));
        } else {
            page.show(Locator::css(".login-error"));
        }
    });
    target
}

/// Handles the `dismiss_banner` custom command by clicking the named button
pub struct BannerExtension;

#[async_trait]
impl CommandExtension for BannerExtension {
    async fn execute(
        &self,
        name: &str,
        payload: &Value,
        target: &dyn TargetCapability,
    ) -> Result<(), CapabilityError> {
        match name {
            "dismiss_banner" => {
                let button = payload
                    .get("button")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        CapabilityError::InvalidArgument("dismiss_banner needs a button id".into())
                    })?;
                target.click(&Locator::id(button)).await
            }
            other => Err(CapabilityError::Unsupported(other.to_string())),
        }
    }
}
