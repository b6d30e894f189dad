//! Scriptable in-memory target
//!
//! Models a page as a map of elements with visibility/enabled flags. Clicks
//! and navigations can trigger reactions that mutate the page, which is enough
//! to simulate multi-screen flows without a browser.

use super::{poll_condition, CapabilityError, TargetCapability};
use crate::models::{Condition, Locator};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// State of one simulated element
#[derive(Debug, Clone, PartialEq)]
pub struct ElementState {
    pub visible: bool,
    pub enabled: bool,
    pub value: String,
    pub uploaded: Option<PathBuf>,
}

impl Default for ElementState {
    fn default() -> Self {
        Self {
            visible: true,
            enabled: true,
            value: String::new(),
            uploaded: None,
        }
    }
}

/// Simulated document and browser session
#[derive(Debug, Clone)]
pub struct Page {
    elements: HashMap<Locator, ElementState>,
    scripts: HashMap<String, Value>,
    url: Option<String>,
    windows: Vec<String>,
    current_window: Option<String>,
    frame: Option<Locator>,
    opened_tabs: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            elements: HashMap::new(),
            scripts: HashMap::new(),
            url: None,
            windows: vec!["main".to_string()],
            current_window: Some("main".to_string()),
            frame: None,
            opened_tabs: 0,
        }
    }
}

impl Page {
    /// Insert (or replace) a visible, enabled element
    pub fn show(&mut self, locator: Locator) {
        self.elements.insert(locator, ElementState::default());
    }

    pub fn insert(&mut self, locator: Locator, state: ElementState) {
        self.elements.insert(locator, state);
    }

    /// Keep the element in the document but make it invisible
    pub fn hide(&mut self, locator: &Locator) {
        if let Some(element) = self.elements.get_mut(locator) {
            element.visible = false;
        }
    }

    pub fn disable(&mut self, locator: &Locator) {
        if let Some(element) = self.elements.get_mut(locator) {
            element.enabled = false;
        }
    }

    pub fn remove(&mut self, locator: &Locator) {
        self.elements.remove(locator);
    }

    /// Remove every element
    pub fn clear_elements(&mut self) {
        self.elements.clear();
    }

    pub fn element(&self, locator: &Locator) -> Option<&ElementState> {
        self.elements.get(locator)
    }

    pub fn set_script_result(&mut self, script: impl Into<String>, value: Value) {
        self.scripts.insert(script.into(), value);
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn current_window(&self) -> Option<&str> {
        self.current_window.as_deref()
    }

    pub fn windows(&self) -> &[String] {
        &self.windows
    }

    pub fn frame(&self) -> Option<&Locator> {
        self.frame.as_ref()
    }

    fn interactable(&mut self, locator: &Locator) -> Result<&mut ElementState, CapabilityError> {
        let element = self
            .elements
            .get_mut(locator)
            .ok_or_else(|| CapabilityError::ElementNotFound(locator.to_string()))?;
        if !element.visible || !element.enabled {
            return Err(CapabilityError::NotInteractable(locator.to_string()));
        }
        Ok(element)
    }
}

/// Call recorded by [`InMemoryTarget`]
#[derive(Debug, Clone, PartialEq)]
pub enum TargetCall {
    Click(Locator),
    TypeText(Locator, String),
    Clear(Locator),
    Select(Locator, String),
    Navigate(String),
    Refresh,
    ExecuteScript(String),
    UploadFile(Locator, PathBuf),
    SwitchToFrame(Locator),
    SwitchToDefaultFrame,
    SwitchWindow(String),
    CloseWindow,
    OpenNewTab(Option<String>),
}

pub type Reaction = Arc<dyn Fn(&mut Page) + Send + Sync>;

#[derive(Default)]
struct Inner {
    page: Page,
    click_reactions: HashMap<Locator, Vec<Reaction>>,
    navigate_reactions: HashMap<String, Vec<Reaction>>,
    failures: HashMap<Locator, CapabilityError>,
    session_lost: Option<String>,
    journal: Vec<TargetCall>,
    probes: usize,
}

impl Inner {
    fn check_session(&self) -> Result<(), CapabilityError> {
        match &self.session_lost {
            Some(reason) => Err(CapabilityError::SessionLost(reason.clone())),
            None => Ok(()),
        }
    }

    fn check_failure(&self, locator: &Locator) -> Result<(), CapabilityError> {
        self.check_session()?;
        match self.failures.get(locator) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn probe(&mut self, locator: &Locator) -> Result<Option<&ElementState>, CapabilityError> {
        self.check_failure(locator)?;
        self.probes += 1;
        Ok(self.page.elements.get(locator))
    }
}

/// In-memory [`TargetCapability`] with scripted page reactions
#[derive(Default)]
pub struct InMemoryTarget {
    inner: Mutex<Inner>,
}

impl InMemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutate the page directly
    pub fn update_page<F: FnOnce(&mut Page)>(&self, f: F) {
        f(&mut self.lock().page);
    }

    /// Snapshot of the page
    pub fn page(&self) -> Page {
        self.lock().page.clone()
    }

    /// Run `reaction` after every successful click on `locator`
    pub fn on_click<F>(&self, locator: Locator, reaction: F)
    where
        F: Fn(&mut Page) + Send + Sync + 'static,
    {
        self.lock()
            .click_reactions
            .entry(locator)
            .or_default()
            .push(Arc::new(reaction));
    }

    /// Run `reaction` after every navigation to `url`
    pub fn on_navigate<F>(&self, url: impl Into<String>, reaction: F)
    where
        F: Fn(&mut Page) + Send + Sync + 'static,
    {
        self.lock()
            .navigate_reactions
            .entry(url.into())
            .or_default()
            .push(Arc::new(reaction));
    }

    /// Make every call touching `locator` fail with `error`
    pub fn fail_on(&self, locator: Locator, error: CapabilityError) {
        self.lock().failures.insert(locator, error);
    }

    /// Make every subsequent call fail with `SessionLost`
    pub fn lose_session(&self, reason: impl Into<String>) {
        self.lock().session_lost = Some(reason.into());
    }

    /// Interaction calls made so far, in order
    pub fn calls(&self) -> Vec<TargetCall> {
        self.lock().journal.clone()
    }

    /// Number of element checks (visible/existing/enabled) made so far
    pub fn probe_count(&self) -> usize {
        self.lock().probes
    }
}

#[async_trait]
impl TargetCapability for InMemoryTarget {
    async fn click(&self, locator: &Locator) -> Result<(), CapabilityError> {
        let mut inner = self.lock();
        inner.check_failure(locator)?;
        inner.page.interactable(locator)?;
        inner.journal.push(TargetCall::Click(locator.clone()));

        let reactions = inner.click_reactions.get(locator).cloned().unwrap_or_default();
        for reaction in reactions {
            reaction(&mut inner.page);
        }
        Ok(())
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> Result<(), CapabilityError> {
        let mut inner = self.lock();
        inner.check_failure(locator)?;
        inner.page.interactable(locator)?.value = text.to_string();
        inner
            .journal
            .push(TargetCall::TypeText(locator.clone(), text.to_string()));
        Ok(())
    }

    async fn clear(&self, locator: &Locator) -> Result<(), CapabilityError> {
        let mut inner = self.lock();
        inner.check_failure(locator)?;
        inner.page.interactable(locator)?.value.clear();
        inner.journal.push(TargetCall::Clear(locator.clone()));
        Ok(())
    }

    async fn select(&self, locator: &Locator, value: &str) -> Result<(), CapabilityError> {
        let mut inner = self.lock();
        inner.check_failure(locator)?;
        inner.page.interactable(locator)?.value = value.to_string();
        inner
            .journal
            .push(TargetCall::Select(locator.clone(), value.to_string()));
        Ok(())
    }

    async fn navigate(&self, url: &str) -> Result<(), CapabilityError> {
        let parsed =
            url::Url::parse(url).map_err(|e| CapabilityError::InvalidArgument(format!("{}: {}", url, e)))?;

        let mut inner = self.lock();
        inner.check_session()?;
        inner.page.url = Some(parsed.to_string());
        inner.journal.push(TargetCall::Navigate(url.to_string()));

        let reactions = inner.navigate_reactions.get(url).cloned().unwrap_or_default();
        for reaction in reactions {
            reaction(&mut inner.page);
        }
        Ok(())
    }

    async fn refresh(&self) -> Result<(), CapabilityError> {
        let mut inner = self.lock();
        inner.check_session()?;
        inner.journal.push(TargetCall::Refresh);
        Ok(())
    }

    async fn execute_script(&self, script: &str, _args: &[Value]) -> Result<Value, CapabilityError> {
        let mut inner = self.lock();
        inner.check_session()?;
        inner.journal.push(TargetCall::ExecuteScript(script.to_string()));
        Ok(inner.page.scripts.get(script).cloned().unwrap_or(Value::Null))
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool, CapabilityError> {
        let mut inner = self.lock();
        Ok(inner.probe(locator)?.map(|e| e.visible).unwrap_or(false))
    }

    async fn is_existing(&self, locator: &Locator) -> Result<bool, CapabilityError> {
        let mut inner = self.lock();
        Ok(inner.probe(locator)?.is_some())
    }

    async fn is_enabled(&self, locator: &Locator) -> Result<bool, CapabilityError> {
        let mut inner = self.lock();
        Ok(inner.probe(locator)?.map(|e| e.enabled).unwrap_or(false))
    }

    async fn wait_for_condition(
        &self,
        condition: &Condition,
        timeout: Duration,
    ) -> Result<bool, CapabilityError> {
        poll_condition(self, condition, timeout, WAIT_POLL_INTERVAL).await
    }

    async fn upload_file(&self, locator: &Locator, path: &Path) -> Result<(), CapabilityError> {
        let mut inner = self.lock();
        inner.check_failure(locator)?;
        let element = inner
            .page
            .elements
            .get_mut(locator)
            .ok_or_else(|| CapabilityError::ElementNotFound(locator.to_string()))?;
        element.uploaded = Some(path.to_path_buf());
        inner
            .journal
            .push(TargetCall::UploadFile(locator.clone(), path.to_path_buf()));
        Ok(())
    }

    async fn switch_to_frame(&self, locator: &Locator) -> Result<(), CapabilityError> {
        let mut inner = self.lock();
        inner.check_failure(locator)?;
        if !inner.page.elements.contains_key(locator) {
            return Err(CapabilityError::ElementNotFound(locator.to_string()));
        }
        inner.page.frame = Some(locator.clone());
        inner.journal.push(TargetCall::SwitchToFrame(locator.clone()));
        Ok(())
    }

    async fn switch_to_default_frame(&self) -> Result<(), CapabilityError> {
        let mut inner = self.lock();
        inner.check_session()?;
        inner.page.frame = None;
        inner.journal.push(TargetCall::SwitchToDefaultFrame);
        Ok(())
    }

    async fn switch_window(&self, handle: &str) -> Result<(), CapabilityError> {
        let mut inner = self.lock();
        inner.check_session()?;
        if !inner.page.windows.iter().any(|w| w == handle) {
            return Err(CapabilityError::InvalidArgument(format!(
                "no window with handle '{}'",
                handle
            )));
        }
        inner.page.current_window = Some(handle.to_string());
        inner.page.frame = None;
        inner.journal.push(TargetCall::SwitchWindow(handle.to_string()));
        Ok(())
    }

    async fn close_window(&self) -> Result<(), CapabilityError> {
        let mut inner = self.lock();
        inner.check_session()?;
        let current = inner
            .page
            .current_window
            .take()
            .ok_or_else(|| CapabilityError::Other("no current window".to_string()))?;
        inner.page.windows.retain(|w| *w != current);
        inner.journal.push(TargetCall::CloseWindow);
        Ok(())
    }

    async fn open_new_tab(&self, url: Option<&str>) -> Result<(), CapabilityError> {
        let mut inner = self.lock();
        inner.check_session()?;
        inner.page.opened_tabs += 1;
        let handle = format!("tab-{}", inner.page.opened_tabs);
        inner.page.windows.push(handle.clone());
        inner.page.current_window = Some(handle);
        inner.page.frame = None;
        if let Some(url) = url {
            inner.page.url = Some(url.to_string());
        }
        inner
            .journal
            .push(TargetCall::OpenNewTab(url.map(str::to_string)));
        Ok(())
    }
}
