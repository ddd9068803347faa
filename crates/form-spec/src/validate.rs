use std::collections::{BTreeMap, HashMap};
use std::sync::{LazyLock, Mutex, PoisonError};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use regex::Regex;
use serde::Serialize;

use crate::spec::field::{FieldSpec, FieldType};
use crate::spec::form::FormSpec;
use crate::spec::rule::{CustomOutcome, ValidationRule, ValidationType};
use crate::value::{FieldValue, FileRef, FormValues};

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));
static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://(www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b([-a-zA-Z0-9()@:%_+.~#?&/=]*)$",
    )
    .expect("url pattern")
});
static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+]?[(]?[0-9]{3}[)]?[-\s.]?[0-9]{3}[-\s.]?[0-9]{4,6}$").expect("phone pattern")
});
static ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("alphanumeric pattern"));
static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("numeric pattern"));

/// Compiled user patterns keyed by source.
static PATTERNS: LazyLock<Mutex<HashMap<String, Result<Regex, regex::Error>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));
const PATTERN_CACHE_LIMIT: usize = 256;

/// Compiles a rule's pattern once and reuses it on later validations.
pub(crate) fn compiled_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let mut cache = PATTERNS.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(compiled) = cache.get(pattern) {
        return compiled.clone();
    }
    if cache.len() >= PATTERN_CACHE_LIMIT {
        cache.clear();
    }
    let compiled = Regex::new(pattern);
    cache.insert(pattern.to_string(), compiled.clone());
    compiled
}

impl ValidationType {
    pub fn pattern(&self) -> &'static Regex {
        match self {
            ValidationType::Email => &EMAIL,
            ValidationType::Url => &URL,
            ValidationType::Phone => &PHONE,
            ValidationType::Alphanumeric => &ALPHANUMERIC,
            ValidationType::Numeric => &NUMERIC,
        }
    }
}

/// A single failed rule on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub code: &'static str,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of validating every declared field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: BTreeMap<String, FieldError>,
}

impl ValidationReport {
    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(|error| error.message.as_str())
    }
}

/// Validates every declared field. Visibility is not consulted.
pub fn validate_all(spec: &FormSpec, values: &FormValues) -> ValidationReport {
    let empty = FieldValue::Empty;
    let errors: BTreeMap<_, _> = spec
        .fields
        .iter()
        .filter_map(|field| {
            let value = values.get(&field.name).unwrap_or(&empty);
            validate_field(field, value, values).map(|error| (field.name.clone(), error))
        })
        .collect();

    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}

/// Evaluates the field's rules in priority order and returns the first failure.
///
/// A file field's accept list applies even when it carries no validation rule.
pub fn validate_field(
    field: &FieldSpec,
    value: &FieldValue,
    all_values: &FormValues,
) -> Option<FieldError> {
    let unconstrained = ValidationRule::default();
    let rule = field.validation.as_ref().unwrap_or(&unconstrained);
    let fail = |code: &'static str, message: String| {
        Some(FieldError {
            field: field.name.clone(),
            message,
            code,
        })
    };

    if rule.required && !value.is_truthy() {
        return if field.kind == FieldType::File {
            fail("file_required", rule.message_or(|| "Please select a file".into()))
        } else {
            fail(
                "required",
                rule.message_or(|| format!("{} is required", field.display_name())),
            )
        };
    }

    if let Some(other) = &rule.matches
        && all_values.get(other) != Some(value)
    {
        let message = rule
            .match_message
            .clone()
            .unwrap_or_else(|| format!("{} must match {}", field.display_name(), other));
        return fail("mismatch", message);
    }

    if field.kind == FieldType::File
        && let Some(accept) = &field.accept
        && let Some(accepted) = accept_set(accept)
        && value.files().iter().any(|file| !file_accepted(&accepted, file))
    {
        return fail(
            "file_type",
            rule.message_or(|| "File type is not accepted".into()),
        );
    }

    if let Some(error) = check_length(rule, value) {
        return fail(error.0, error.1);
    }

    let number = value.to_number();
    if let Some(min) = rule.min
        && number < min
    {
        return fail("min", rule.message_or(|| format!("Minimum value is {min}")));
    }
    if let Some(max) = rule.max
        && number > max
    {
        return fail("max", rule.message_or(|| format!("Maximum value is {max}")));
    }

    let text = value.as_text().filter(|text| !text.is_empty());

    if let Some(kind) = rule.validation_type
        && let Some(text) = text
        && !kind.pattern().is_match(text)
    {
        return fail(
            "format",
            rule.message_or(|| format!("Invalid {} format", kind.as_str())),
        );
    }

    if let Some(pattern) = &rule.pattern
        && let Some(text) = text
    {
        match compiled_pattern(pattern) {
            Ok(regex) if !regex.is_match(text) => {
                return fail("pattern", rule.message_or(|| "Invalid format".into()));
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(field = %field.name, %err, "skipping invalid pattern");
            }
        }
    }

    if let Some(custom) = &rule.custom {
        match custom.check(value) {
            CustomOutcome::Valid => {}
            CustomOutcome::Invalid => {
                return fail("custom", rule.message_or(|| "Invalid value".into()));
            }
            CustomOutcome::Message(message) => return fail("custom", message),
        }
    }

    None
}

fn check_length(rule: &ValidationRule, value: &FieldValue) -> Option<(&'static str, String)> {
    let length = value.length()?;

    if let Some(min) = rule.min_length.filter(|min| *min > 0)
        && length < min
    {
        return Some((
            "min_length",
            rule.message_or(|| format!("Minimum length is {min} characters")),
        ));
    }

    if let Some(max) = rule.max_length.filter(|max| *max > 0)
        && length > max
    {
        return Some((
            "max_length",
            rule.message_or(|| format!("Maximum length is {max} characters")),
        ));
    }

    None
}

/// Accept entries split into extension and media type matchers.
pub(crate) struct AcceptSet {
    extensions: GlobSet,
    media_types: GlobSet,
}

/// Parses an HTML style accept list. `None` when it yields no usable entry.
pub(crate) fn accept_set(accept: &str) -> Option<AcceptSet> {
    let mut extensions = GlobSetBuilder::new();
    let mut media_types = GlobSetBuilder::new();
    let mut any = false;

    for entry in accept.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        let (builder, pattern) = if entry.starts_with('.') {
            (&mut extensions, format!("*{entry}"))
        } else {
            (&mut media_types, entry.to_string())
        };
        match GlobBuilder::new(&pattern).case_insensitive(true).build() {
            Ok(glob) => {
                builder.add(glob);
                any = true;
            }
            Err(err) => tracing::warn!(entry, %err, "ignoring accept entry"),
        }
    }

    if !any {
        return None;
    }

    Some(AcceptSet {
        extensions: extensions.build().ok()?,
        media_types: media_types.build().ok()?,
    })
}

fn file_accepted(accepted: &AcceptSet, file: &FileRef) -> bool {
    accepted.extensions.is_match(&file.name) || accepted.media_types.is_match(&file.media_type)
}
