use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::payload::plain_json;
use crate::spec::field::{FieldSpec, FieldType, SelectOption};
use crate::spec::form::FormSpec;
use crate::state::{Banner, FormState, SubmissionPhase};
use crate::value::FieldValue;
use crate::visibility::is_visible;

const DEFAULT_TEXTAREA_ROWS: u32 = 4;
const LOADING_LABEL: &str = "Loading...";

/// Input control a renderer should draw for a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum Widget {
    Input {
        input_type: &'static str,
        placeholder: Option<String>,
    },
    Textarea {
        rows: u32,
        placeholder: Option<String>,
    },
    Select {
        placeholder: String,
        options: Vec<SelectOption>,
    },
    /// The checkbox carries its own label.
    Checkbox { label: Option<String> },
    RadioGroup { options: Vec<SelectOption> },
    FileInput {
        accept: Option<String>,
        multiple: bool,
    },
    DateTime { input_type: &'static str },
}

pub fn widget_for(field: &FieldSpec) -> Widget {
    match field.kind {
        FieldType::Textarea => Widget::Textarea {
            rows: field.rows.unwrap_or(DEFAULT_TEXTAREA_ROWS),
            placeholder: field.placeholder.clone(),
        },
        FieldType::Select => Widget::Select {
            placeholder: field
                .placeholder
                .clone()
                .unwrap_or_else(|| "Select...".into()),
            options: field.options.clone(),
        },
        FieldType::Checkbox => Widget::Checkbox {
            label: field.label.clone(),
        },
        FieldType::Radio => Widget::RadioGroup {
            options: field.options.clone(),
        },
        FieldType::File => Widget::FileInput {
            accept: field.accept.clone(),
            multiple: field.multiple,
        },
        FieldType::Date | FieldType::Time | FieldType::DatetimeLocal => Widget::DateTime {
            input_type: field.kind.as_str(),
        },
        FieldType::Text
        | FieldType::Email
        | FieldType::Password
        | FieldType::Number
        | FieldType::Tel
        | FieldType::Url => Widget::Input {
            input_type: field.kind.as_str(),
            placeholder: field.placeholder.clone(),
        },
    }
}

/// Everything a renderer needs for one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub name: String,
    pub label: Option<String>,
    pub required: bool,
    pub widget: Widget,
    pub value: FieldValue,
    /// Present only for touched fields when inline errors are enabled.
    pub error: Option<String>,
    /// Hidden while an error is shown.
    pub helper_text: Option<String>,
    pub visible: bool,
    pub disabled: bool,
}

/// Read-only projection of a form for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormView {
    pub form_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub phase: SubmissionPhase,
    pub banner: Option<Banner>,
    pub fields: Vec<FieldView>,
    pub submit_label: String,
    pub submit_enabled: bool,
    pub cancel_label: Option<String>,
    pub columns: u8,
    pub gap: u8,
}

impl FormView {
    pub fn field(&self, name: &str) -> Option<&FieldView> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn visible_fields(&self) -> impl Iterator<Item = &FieldView> {
        self.fields.iter().filter(|field| field.visible)
    }
}

pub fn build_view(spec: &FormSpec, state: &FormState) -> FormView {
    let settings = &spec.settings;
    let busy = state.phase().is_busy() || settings.loading;
    let inactive = busy || settings.disabled;

    let fields = spec
        .fields
        .iter()
        .map(|field| {
            let error = state
                .error(&field.name)
                .filter(|_| settings.inline_errors && state.is_touched(&field.name))
                .map(str::to_string);
            let helper_text = field
                .helper_text
                .clone()
                .filter(|_| state.error(&field.name).is_none());
            let label = field
                .label
                .clone()
                .filter(|_| settings.show_labels && field.kind != FieldType::Checkbox);
            FieldView {
                name: field.name.clone(),
                label,
                required: field.is_required(),
                widget: widget_for(field),
                value: state.value(&field.name).cloned().unwrap_or_default(),
                error,
                helper_text,
                visible: is_visible(field, state.values()),
                disabled: settings.disabled || settings.loading || field.disabled,
            }
        })
        .collect();

    FormView {
        form_id: spec.id.clone(),
        title: spec.title.clone(),
        description: spec.description.clone(),
        phase: state.phase(),
        banner: state.banner().cloned(),
        fields,
        submit_label: if busy {
            LOADING_LABEL.to_string()
        } else {
            settings.submit_text.clone()
        },
        submit_enabled: !inactive,
        cancel_label: settings
            .cancellable
            .then(|| settings.cancel_text.clone()),
        columns: settings.layout.columns,
        gap: settings.layout.gap,
    }
}

/// Render the view as a structured JSON-friendly value.
pub fn render_json_ui(view: &FormView) -> Value {
    let fields = view
        .fields
        .iter()
        .map(|field| {
            let mut map = Map::new();
            map.insert("name".into(), Value::String(field.name.clone()));
            if let Some(label) = &field.label {
                map.insert("label".into(), Value::String(label.clone()));
            }
            map.insert("required".into(), Value::Bool(field.required));
            map.insert(
                "widget".into(),
                serde_json::to_value(&field.widget).unwrap_or(Value::Null),
            );
            map.insert("value".into(), plain_json(&field.value));
            if let Some(error) = &field.error {
                map.insert("error".into(), Value::String(error.clone()));
            }
            if let Some(helper_text) = &field.helper_text {
                map.insert("helper_text".into(), Value::String(helper_text.clone()));
            }
            map.insert("visible".into(), Value::Bool(field.visible));
            map.insert("disabled".into(), Value::Bool(field.disabled));
            Value::Object(map)
        })
        .collect::<Vec<_>>();

    json!({
        "form_id": view.form_id,
        "title": view.title,
        "description": view.description,
        "phase": view.phase.as_str(),
        "banner": view.banner,
        "fields": fields,
        "actions": {
            "submit": { "label": view.submit_label, "enabled": view.submit_enabled },
            "cancel": view.cancel_label.as_ref().map(|label| json!({
                "label": label,
                "enabled": view.submit_enabled,
            })),
        },
        "layout": { "columns": view.columns, "gap": view.gap },
    })
}

/// Render the view as human-friendly text. Hidden fields are omitted.
pub fn render_text(view: &FormView) -> String {
    let mut lines = Vec::new();
    match &view.title {
        Some(title) => lines.push(format!("Form: {} ({})", title, view.form_id)),
        None => lines.push(format!("Form: {}", view.form_id)),
    }
    if let Some(description) = &view.description {
        lines.push(description.clone());
    }
    lines.push(format!("Status: {}", view.phase.as_str()));
    if let Some(banner) = &view.banner {
        lines.push(format!("> {}", banner.text));
    }

    lines.push("Fields:".to_string());
    for field in view.visible_fields() {
        let mut entry = match &field.label {
            Some(label) => format!(" - {} ({})", field.name, label),
            None => format!(" - {}", field.name),
        };
        if field.required {
            entry.push_str(" *");
        }
        if field.disabled {
            entry.push_str(" [disabled]");
        }
        let value = value_to_display(&field.value);
        if !value.is_empty() {
            entry.push_str(&format!(" = {}", value));
        }
        lines.push(entry);
        if let Some(error) = &field.error {
            lines.push(format!("   ! {}", error));
        } else if let Some(helper_text) = &field.helper_text {
            lines.push(format!("   {}", helper_text));
        }
    }

    let mut actions = format!(
        "[{}{}]",
        view.submit_label,
        if view.submit_enabled { "" } else { " (disabled)" }
    );
    if let Some(cancel) = &view.cancel_label {
        actions.push_str(&format!(" [{}]", cancel));
    }
    lines.push(actions);

    lines.join("\n")
}

fn value_to_display(value: &FieldValue) -> String {
    match value {
        FieldValue::Empty => String::new(),
        FieldValue::Bool(flag) => flag.to_string(),
        FieldValue::Text(text) => text.clone(),
        FieldValue::File(file) => format!("{} ({} bytes)", file.name, file.size),
        FieldValue::Files(files) => files
            .iter()
            .map(|file| file.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    }
}
