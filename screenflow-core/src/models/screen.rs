//! Screen descriptors: the declarative rules that identify a screen

use crate::error::EngineError;
use crate::models::locator::{Condition, Locator};
use crate::target::{CapabilityError, TargetCapability};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Opaque, comparable identity of a screen
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreenTag(String);

impl ScreenTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScreenTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScreenTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<String> for ScreenTag {
    fn from(tag: String) -> Self {
        Self(tag)
    }
}

/// How the descriptor's locator is checked against the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStrategy {
    /// Element must be visible and enabled
    #[default]
    VisibleAndEnabled,
    /// Element must exist in the document, visible or not
    PresenceOnly,
    /// Locator is ignored; every criterion must hold
    CustomPredicate,
}

/// Caller-supplied predicate evaluated against the target
#[async_trait]
pub trait ScreenPredicate: Send + Sync {
    async fn evaluate(&self, target: &dyn TargetCapability) -> Result<bool, CapabilityError>;

    /// Short description for logs
    fn describe(&self) -> String {
        "custom predicate".to_string()
    }
}

/// One additional check ANDed into a descriptor's detection
#[derive(Clone)]
pub enum Criterion {
    Condition(Condition),
    Custom(Arc<dyn ScreenPredicate>),
}

impl Criterion {
    pub fn custom(predicate: impl ScreenPredicate + 'static) -> Self {
        Criterion::Custom(Arc::new(predicate))
    }

    pub async fn evaluate(&self, target: &dyn TargetCapability) -> Result<bool, CapabilityError> {
        match self {
            Criterion::Condition(condition) => condition.evaluate(target).await,
            Criterion::Custom(predicate) => predicate.evaluate(target).await,
        }
    }
}

impl From<Condition> for Criterion {
    fn from(condition: Condition) -> Self {
        Criterion::Condition(condition)
    }
}

impl fmt::Debug for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::Condition(condition) => f.debug_tuple("Condition").field(condition).finish(),
            Criterion::Custom(predicate) => f.debug_tuple("Custom").field(&predicate.describe()).finish(),
        }
    }
}

/// Declarative rule set identifying one screen.
///
/// Immutable once built. A `CustomPredicate` descriptor always carries at
/// least one criterion; [`ScreenDescriptorBuilder::build`] enforces it.
#[derive(Debug, Clone)]
pub struct ScreenDescriptor {
    tag: ScreenTag,
    locator: Locator,
    label: Option<String>,
    strategy: DetectionStrategy,
    criteria: Vec<Criterion>,
    metadata: BTreeMap<String, Value>,
}

impl ScreenDescriptor {
    pub fn builder(tag: impl Into<ScreenTag>, locator: Locator) -> ScreenDescriptorBuilder {
        ScreenDescriptorBuilder {
            tag: tag.into(),
            locator,
            label: None,
            strategy: DetectionStrategy::default(),
            criteria: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Descriptor detected when `locator` is visible and enabled
    pub fn visible(tag: impl Into<ScreenTag>, locator: Locator) -> Self {
        Self {
            tag: tag.into(),
            locator,
            label: None,
            strategy: DetectionStrategy::VisibleAndEnabled,
            criteria: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Descriptor detected when `locator` exists, visible or not
    pub fn present(tag: impl Into<ScreenTag>, locator: Locator) -> Self {
        Self {
            strategy: DetectionStrategy::PresenceOnly,
            ..Self::visible(tag, locator)
        }
    }

    pub fn tag(&self) -> &ScreenTag {
        &self.tag
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Label if set, otherwise the tag
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(self.tag.as_str())
    }

    pub fn strategy(&self) -> DetectionStrategy {
        self.strategy
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    /// Check the descriptor invariants
    pub fn validate(&self) -> Result<(), String> {
        if self.strategy == DetectionStrategy::CustomPredicate && self.criteria.is_empty() {
            return Err(format!(
                "screen '{}' uses the custom predicate strategy but has no criteria",
                self.tag
            ));
        }
        Ok(())
    }
}

/// Builder for [`ScreenDescriptor`]
pub struct ScreenDescriptorBuilder {
    tag: ScreenTag,
    locator: Locator,
    label: Option<String>,
    strategy: DetectionStrategy,
    criteria: Vec<Criterion>,
    metadata: BTreeMap<String, Value>,
}

impl ScreenDescriptorBuilder {
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn strategy(mut self, strategy: DetectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn criterion(mut self, criterion: impl Into<Criterion>) -> Self {
        self.criteria.push(criterion.into());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn build(self) -> Result<ScreenDescriptor, EngineError> {
        let descriptor = ScreenDescriptor {
            tag: self.tag,
            locator: self.locator,
            label: self.label,
            strategy: self.strategy,
            criteria: self.criteria,
            metadata: self.metadata,
        };
        descriptor.validate().map_err(EngineError::Configuration)?;
        Ok(descriptor)
    }
}
