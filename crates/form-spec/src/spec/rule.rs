use std::fmt;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::value::FieldValue;

/// Built-in format checks bound to fixed patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ValidationType {
    Email,
    Url,
    Phone,
    Alphanumeric,
    Numeric,
}

impl ValidationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationType::Email => "email",
            ValidationType::Url => "url",
            ValidationType::Phone => "phone",
            ValidationType::Alphanumeric => "alphanumeric",
            ValidationType::Numeric => "numeric",
        }
    }
}

/// Result of a caller supplied predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomOutcome {
    Valid,
    /// Fails with the rule's `message`, or a generic fallback.
    Invalid,
    /// Fails with this exact text.
    Message(String),
}

impl From<bool> for CustomOutcome {
    fn from(valid: bool) -> Self {
        if valid {
            CustomOutcome::Valid
        } else {
            CustomOutcome::Invalid
        }
    }
}

impl From<String> for CustomOutcome {
    fn from(message: String) -> Self {
        CustomOutcome::Message(message)
    }
}

impl From<&str> for CustomOutcome {
    fn from(message: &str) -> Self {
        CustomOutcome::Message(message.to_string())
    }
}

type Predicate = dyn Fn(&FieldValue) -> CustomOutcome + Send + Sync;

/// Arbitrary predicate attached to a rule. Only constructible from code.
#[derive(Clone)]
pub struct CustomRule(Arc<Predicate>);

impl CustomRule {
    pub fn new<F, O>(predicate: F) -> Self
    where
        F: Fn(&FieldValue) -> O + Send + Sync + 'static,
        O: Into<CustomOutcome>,
    {
        Self(Arc::new(move |value| predicate(value).into()))
    }

    pub fn check(&self, value: &FieldValue) -> CustomOutcome {
        (self.0)(value)
    }
}

impl fmt::Debug for CustomRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomRule(..)")
    }
}

impl PartialEq for CustomRule {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Constraints attached to a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Regular expression source, searched (not anchored) in the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_type: Option<ValidationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip)]
    pub custom: Option<CustomRule>,
    /// Name of another field whose value must be equal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_message: Option<String>,
}

impl ValidationRule {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_custom<F, O>(mut self, predicate: F) -> Self
    where
        F: Fn(&FieldValue) -> O + Send + Sync + 'static,
        O: Into<CustomOutcome>,
    {
        self.custom = Some(CustomRule::new(predicate));
        self
    }

    /// The rule's own message, or the provided default text.
    pub(crate) fn message_or(&self, default: impl FnOnce() -> String) -> String {
        self.message.clone().unwrap_or_else(default)
    }
}
