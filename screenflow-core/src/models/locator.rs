//! Element locators and target-side conditions

use crate::target::{CapabilityError, TargetCapability};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// How a locator value is interpreted by the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorKind {
    Id,
    Css,
    XPath,
    Name,
    ClassName,
    TagName,
    LinkText,
}

impl LocatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocatorKind::Id => "id",
            LocatorKind::Css => "css",
            LocatorKind::XPath => "xpath",
            LocatorKind::Name => "name",
            LocatorKind::ClassName => "class_name",
            LocatorKind::TagName => "tag_name",
            LocatorKind::LinkText => "link_text",
        }
    }
}

/// A (kind, value) pair identifying one element on the target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub by: LocatorKind,
    pub value: String,
}

impl Locator {
    pub fn new(by: LocatorKind, value: impl Into<String>) -> Self {
        Self {
            by,
            value: value.into(),
        }
    }

    pub fn id(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::Id, value)
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::Css, value)
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::XPath, value)
    }

    pub fn name(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::Name, value)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.by.as_str(), self.value)
    }
}

/// A serializable predicate the target can evaluate on its own.
///
/// Used by `wait_for_condition` and as a descriptor criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "arg", rename_all = "snake_case")]
pub enum Condition {
    Visible(Locator),
    Present(Locator),
    Enabled(Locator),
    Absent(Locator),
    /// Script whose return value is truthy
    ScriptTruthy(String),
}

impl Condition {
    pub async fn evaluate(&self, target: &dyn TargetCapability) -> Result<bool, CapabilityError> {
        match self {
            Condition::Visible(locator) => target.is_visible(locator).await,
            Condition::Present(locator) => target.is_existing(locator).await,
            Condition::Enabled(locator) => target.is_enabled(locator).await,
            Condition::Absent(locator) => Ok(!target.is_existing(locator).await?),
            Condition::ScriptTruthy(script) => {
                let value = target.execute_script(script, &[]).await?;
                Ok(is_truthy(&value))
            }
        }
    }
}

/// Script-style truthiness of a JSON value
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_locator_display() {
        assert_eq!(Locator::id("login").to_string(), "id=login");
        assert_eq!(Locator::css("input[type=email]").to_string(), "css=input[type=email]");
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("ready")));
        assert!(is_truthy(&json!([])));
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(false)));
    }

    #[test]
    fn test_condition_serialization() {
        let condition = Condition::Visible(Locator::id("x"));
        let json = serde_json::to_value(&condition).unwrap();
        assert_eq!(json, json!({"type": "visible", "arg": {"by": "id", "value": "x"}}));
    }
}
