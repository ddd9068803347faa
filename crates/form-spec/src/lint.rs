//! Static checks for form definitions.
//!
//! The runtime tolerates every issue reported here (unknown targets never match,
//! bad patterns are skipped, unknown conditions show the field); this module
//! surfaces them before a form goes live.

use std::collections::HashSet;

use serde::Serialize;

use crate::spec::field::Condition;
use crate::spec::form::{FormSpec, Layout};
use crate::validate::{accept_set, compiled_pattern};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub field: Option<String>,
    pub message: String,
}

impl Issue {
    fn error(field: Option<&str>, message: String) -> Self {
        Self {
            severity: Severity::Error,
            field: field.map(str::to_string),
            message,
        }
    }

    fn warning(field: Option<&str>, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            field: field.map(str::to_string),
            message,
        }
    }
}

pub fn check(spec: &FormSpec) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();
    let names: HashSet<&str> = spec.fields.iter().map(|field| field.name.as_str()).collect();

    for field in &spec.fields {
        let name = Some(field.name.as_str());
        if field.name.trim().is_empty() {
            issues.push(Issue::error(name, "field name is empty".into()));
        }
        if !seen.insert(field.name.as_str()) {
            issues.push(Issue::error(name, format!("duplicate field name '{}'", field.name)));
        }

        if let Some(depends_on) = &field.depends_on {
            if !names.contains(depends_on.field.as_str()) {
                issues.push(Issue::warning(
                    name,
                    format!("dependsOn refers to unknown field '{}'", depends_on.field),
                ));
            }
            if depends_on.condition == Condition::Unknown {
                issues.push(Issue::warning(
                    name,
                    "unknown dependsOn condition; the field is always shown".into(),
                ));
            }
        }

        if let Some(rule) = &field.validation {
            if let Some(target) = &rule.matches
                && !names.contains(target.as_str())
            {
                issues.push(Issue::error(
                    name,
                    format!("matches refers to unknown field '{target}'"),
                ));
            }
            if let Some(pattern) = &rule.pattern
                && let Err(err) = compiled_pattern(pattern)
            {
                issues.push(Issue::error(name, format!("invalid pattern: {err}")));
            }
            if let (Some(min), Some(max)) = (rule.min_length, rule.max_length)
                && min > max
            {
                issues.push(Issue::warning(
                    name,
                    format!("minLength {min} exceeds maxLength {max}"),
                ));
            }
            if let (Some(min), Some(max)) = (rule.min, rule.max)
                && min > max
            {
                issues.push(Issue::warning(name, format!("min {min} exceeds max {max}")));
            }
        }

        if field.kind.has_options() && field.options.is_empty() {
            issues.push(Issue::warning(
                name,
                format!("{} field has no options", field.kind.as_str()),
            ));
        }
        if !field.kind.has_options() && !field.options.is_empty() {
            issues.push(Issue::warning(
                name,
                format!("options are ignored on {} fields", field.kind.as_str()),
            ));
        }
        if !field.default_matches_kind() {
            issues.push(Issue::warning(
                name,
                format!("defaultValue does not fit a {} field", field.kind.as_str()),
            ));
        }
        if let Some(accept) = &field.accept
            && accept_set(accept).is_none()
        {
            issues.push(Issue::warning(name, format!("accept list '{accept}' has no usable entry")));
        }
    }

    let layout = &spec.settings.layout;
    if !matches!(layout.columns, 1 | 2) {
        issues.push(Issue::warning(
            None,
            format!("layout supports 1 or 2 columns, got {}", layout.columns),
        ));
    }
    if !Layout::GAPS.contains(&layout.gap) {
        issues.push(Issue::warning(None, format!("unsupported layout gap {}", layout.gap)));
    }

    issues
}
