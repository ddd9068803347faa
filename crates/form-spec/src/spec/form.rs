use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::field::FieldSpec;

/// HTTP verbs accepted by a remote endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Post,
    Put,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
        }
    }
}

/// Remote endpoint receiving the encoded payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSpec {
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    /// Applied after `Content-Type: application/json`, so they may override it.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl EndpointSpec {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::default(),
            headers: BTreeMap::new(),
            timeout_secs: None,
        }
    }
}

/// Layout hints; only the presentation layer reads these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Layout {
    #[serde(default = "default_columns")]
    pub columns: u8,
    #[serde(default = "default_gap")]
    pub gap: u8,
}

impl Layout {
    pub const GAPS: [u8; 10] = [0, 1, 2, 3, 4, 5, 6, 8, 10, 12];
}

fn default_columns() -> u8 {
    1
}

fn default_gap() -> u8 {
    4
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            gap: default_gap(),
        }
    }
}

/// Form-level behaviour and labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct FormSettings {
    pub submit_text: String,
    pub cancel_text: String,
    /// Whether a cancel action is offered.
    pub cancellable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<EndpointSpec>,
    pub success_message: String,
    pub show_success_message: bool,
    pub reset_on_submit: bool,
    /// Banner text for failures whose error carries no message.
    pub error_message: String,
    pub loading: bool,
    pub disabled: bool,
    pub show_labels: bool,
    pub inline_errors: bool,
    pub layout: Layout,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            submit_text: "Submit".into(),
            cancel_text: "Cancel".into(),
            cancellable: false,
            endpoint: None,
            success_message: "Form submitted successfully!".into(),
            show_success_message: false,
            reset_on_submit: false,
            error_message: "Something went wrong. Please try again.".into(),
            loading: false,
            disabled: false,
            show_labels: true,
            inline_errors: true,
            layout: Layout::default(),
        }
    }
}

/// Top-level form definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormSpec {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub settings: FormSettings,
}

impl FormSpec {
    pub fn new(id: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            id: id.into(),
            title: None,
            description: None,
            fields,
            settings: FormSettings::default(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Fields whose `matches` rule points at `name`.
    pub fn dependents_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FieldSpec> + 'a {
        self.fields.iter().filter(move |field| {
            field
                .validation
                .as_ref()
                .and_then(|rule| rule.matches.as_deref())
                == Some(name)
        })
    }
}
