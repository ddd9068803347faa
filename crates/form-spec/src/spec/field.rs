use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::spec::rule::ValidationRule;
use crate::value::FieldValue;

/// Supported input kinds. Closed set; renderers match on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Text,
    Email,
    Password,
    Number,
    Tel,
    Url,
    Textarea,
    Select,
    Checkbox,
    Radio,
    File,
    Date,
    Time,
    DatetimeLocal,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Password => "password",
            FieldType::Number => "number",
            FieldType::Tel => "tel",
            FieldType::Url => "url",
            FieldType::Textarea => "textarea",
            FieldType::Select => "select",
            FieldType::Checkbox => "checkbox",
            FieldType::Radio => "radio",
            FieldType::File => "file",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::DatetimeLocal => "datetime-local",
        }
    }

    /// Whether `options` are meaningful for this kind.
    pub fn has_options(&self) -> bool {
        matches!(self, FieldType::Select | FieldType::Radio)
    }

    /// Whether a value of this shape may be stored for the field kind.
    pub fn accepts(&self, value: &FieldValue, multiple: bool) -> bool {
        match self {
            FieldType::Checkbox => matches!(value, FieldValue::Bool(_)),
            FieldType::File => match value {
                FieldValue::Empty | FieldValue::File(_) => true,
                FieldValue::Files(_) => multiple,
                _ => false,
            },
            _ => matches!(value, FieldValue::Empty | FieldValue::Text(_)),
        }
    }
}

/// Choice entry for select and radio fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

/// Comparison applied by a field dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    #[default]
    Equals,
    NotEquals,
    Contains,
    NotEmpty,
    /// Anything the deserializer did not recognise. Evaluates as visible.
    #[serde(other)]
    Unknown,
}

/// Shows a field only when another field's value satisfies a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DependsOn {
    pub field: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub condition: Condition,
}

/// Static configuration of one form input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helper_text: Option<String>,
    /// Comma separated accept list, e.g. `image/*,.pdf`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<DependsOn>,
}

impl FieldSpec {
    /// Minimal descriptor; the remaining attributes use their defaults.
    pub fn new(name: impl Into<String>, kind: FieldType) -> Self {
        Self {
            name: name.into(),
            kind,
            label: None,
            placeholder: None,
            default_value: None,
            options: Vec::new(),
            rows: None,
            disabled: false,
            helper_text: None,
            accept: None,
            multiple: false,
            validation: None,
            depends_on: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_validation(mut self, rule: ValidationRule) -> Self {
        self.validation = Some(rule);
        self
    }

    pub fn with_depends_on(mut self, depends_on: DependsOn) -> Self {
        self.depends_on = Some(depends_on);
        self
    }

    pub fn with_options<I, L, V>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = (L, V)>,
        L: Into<String>,
        V: Into<String>,
    {
        self.options = options
            .into_iter()
            .map(|(label, value)| SelectOption {
                label: label.into(),
                value: value.into(),
            })
            .collect();
        self
    }

    /// Label used in generated messages.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn is_required(&self) -> bool {
        self.validation.as_ref().is_some_and(|rule| rule.required)
    }

    /// Initial value derived from the declared default.
    pub fn initial_value(&self) -> FieldValue {
        match self.kind {
            FieldType::File => FieldValue::Empty,
            FieldType::Checkbox => {
                FieldValue::Bool(self.default_value.as_ref().is_some_and(json_truthy))
            }
            _ => match &self.default_value {
                Some(Value::Null) | None => FieldValue::Text(String::new()),
                Some(Value::Bool(flag)) => FieldValue::Text(flag.to_string()),
                Some(value) => FieldValue::from_json(value),
            },
        }
    }

    /// Whether the declared default already has the shape the field holds.
    pub fn default_matches_kind(&self) -> bool {
        match (&self.kind, &self.default_value) {
            (_, None | Some(Value::Null)) => true,
            (FieldType::Checkbox, Some(value)) => value.is_boolean(),
            (FieldType::File, Some(_)) => false,
            (_, Some(value)) => value.is_string() || value.is_number(),
        }
    }
}

fn json_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
