use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::FormError;
use crate::spec::field::FieldSpec;
use crate::spec::form::FormSpec;
use crate::validate::{ValidationReport, validate_field};
use crate::value::{FieldValue, FormValues};

/// Where the submission state machine currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

impl SubmissionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionPhase::Idle => "idle",
            SubmissionPhase::Validating => "validating",
            SubmissionPhase::Submitting => "submitting",
            SubmissionPhase::Succeeded => "succeeded",
            SubmissionPhase::Failed => "failed",
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, SubmissionPhase::Validating | SubmissionPhase::Submitting)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerKind {
    Success,
    Error,
}

/// Form level message shown above the fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
}

/// Mutable state of one form instance.
///
/// The value, touched and error maps always hold exactly the declared field names.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    values: FormValues,
    touched: BTreeMap<String, bool>,
    errors: BTreeMap<String, Option<String>>,
    phase: SubmissionPhase,
    banner: Option<Banner>,
}

impl FormState {
    /// Builds the initial state. Field names are assumed unique; see [`crate::Form::new`].
    pub fn new(spec: &FormSpec) -> Self {
        let values = initial_values(spec);
        let touched = spec
            .fields
            .iter()
            .map(|field| (field.name.clone(), false))
            .collect();
        let errors = spec
            .fields
            .iter()
            .map(|field| (field.name.clone(), None))
            .collect();
        Self {
            values,
            touched,
            errors,
            phase: SubmissionPhase::Idle,
            banner: None,
        }
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn is_touched(&self, name: &str) -> bool {
        self.touched.get(name).copied().unwrap_or(false)
    }

    pub fn touched_fields(&self) -> impl Iterator<Item = &str> {
        self.touched
            .iter()
            .filter(|(_, touched)| **touched)
            .map(|(name, _)| name.as_str())
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).and_then(|error| error.as_deref())
    }

    /// Fields that currently carry an error.
    pub fn errors(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors
            .iter()
            .filter_map(|(name, error)| error.as_deref().map(|error| (name.as_str(), error)))
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    /// Stores a new value and re-validates the field and fields matching it.
    pub fn change(
        &mut self,
        spec: &FormSpec,
        name: &str,
        value: FieldValue,
    ) -> Result<(), FormError> {
        let field = declared(spec, name)?;
        if !field.kind.accepts(&value, field.multiple) {
            return Err(FormError::ValueKind {
                field: field.name.clone(),
                kind: field.kind.as_str(),
                value: value.kind_label(),
            });
        }

        self.values.insert(field.name.clone(), value);
        self.dismiss_outcome();

        if self.is_touched(name) {
            self.revalidate(field);
        }
        for dependent in spec.dependents_of(name) {
            if self.is_touched(&dependent.name) {
                self.revalidate(dependent);
            }
        }
        Ok(())
    }

    /// Marks the field touched and returns its fresh error, if any.
    pub fn blur(&mut self, spec: &FormSpec, name: &str) -> Result<Option<&str>, FormError> {
        let field = declared(spec, name)?;
        self.touched.insert(field.name.clone(), true);
        self.revalidate(field);
        Ok(self.error(name))
    }

    /// Restores defaults and clears touched flags, errors, banners and any unresolved submission.
    pub fn reset(&mut self, spec: &FormSpec) {
        self.clear_fields(spec);
        self.dismiss_outcome();
        self.phase = SubmissionPhase::Idle;
    }

    /// Whether submit and cancel are refused right now.
    pub fn is_locked(&self, spec: &FormSpec) -> bool {
        self.phase.is_busy() || spec.settings.disabled || spec.settings.loading
    }

    /// Returns a submission that was dropped before resolving to `Idle`.
    pub(crate) fn abandon_submission(&mut self) {
        if self.phase.is_busy() {
            tracing::debug!("submission dropped before it resolved");
            self.phase = SubmissionPhase::Idle;
        }
    }

    pub(crate) fn clear_fields(&mut self, spec: &FormSpec) {
        self.values = initial_values(spec);
        self.touched.values_mut().for_each(|touched| *touched = false);
        self.errors.values_mut().for_each(|error| *error = None);
    }

    pub(crate) fn touch_all(&mut self) {
        self.touched.values_mut().for_each(|touched| *touched = true);
    }

    /// Replaces every error slot with the report's result.
    pub(crate) fn apply_report(&mut self, report: &ValidationReport) {
        for (name, error) in self.errors.iter_mut() {
            *error = report.error(name).map(str::to_string);
        }
    }

    pub(crate) fn set_phase(&mut self, phase: SubmissionPhase) {
        self.phase = phase;
    }

    pub(crate) fn set_banner(&mut self, banner: Option<Banner>) {
        self.banner = banner;
    }

    /// A finished submission returns to idle on the next interaction.
    fn dismiss_outcome(&mut self) {
        if matches!(
            self.phase,
            SubmissionPhase::Succeeded | SubmissionPhase::Failed
        ) {
            self.phase = SubmissionPhase::Idle;
        }
        self.banner = None;
    }

    fn revalidate(&mut self, field: &FieldSpec) {
        let empty = FieldValue::Empty;
        let value = self.values.get(&field.name).unwrap_or(&empty);
        let error = validate_field(field, value, &self.values).map(|error| error.message);
        self.errors.insert(field.name.clone(), error);
    }
}

fn initial_values(spec: &FormSpec) -> FormValues {
    spec.fields
        .iter()
        .map(|field| (field.name.clone(), field.initial_value()))
        .collect()
}

fn declared<'a>(spec: &'a FormSpec, name: &str) -> Result<&'a FieldSpec, FormError> {
    spec.field(name)
        .ok_or_else(|| FormError::UnknownField(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::field::FieldType;
    use crate::spec::rule::ValidationRule;
    use serde_json::json;

    fn spec() -> FormSpec {
        FormSpec::new(
            "signup",
            vec![
                FieldSpec::new("name", FieldType::Text)
                    .with_default(json!("Ada"))
                    .with_validation(ValidationRule::required()),
                FieldSpec::new("agree", FieldType::Checkbox),
            ],
        )
    }

    #[test]
    fn untouched_fields_are_not_validated_on_change() {
        let spec = spec();
        let mut state = FormState::new(&spec);
        state.change(&spec, "name", "".into()).expect("change");
        assert_eq!(state.error("name"), None);

        assert_eq!(
            state.blur(&spec, "name").expect("blur"),
            Some("name is required")
        );
        state.change(&spec, "name", "Grace".into()).expect("change");
        assert_eq!(state.error("name"), None);
    }

    #[test]
    fn rejects_unknown_fields_and_wrong_kinds() {
        let spec = spec();
        let mut state = FormState::new(&spec);
        assert_eq!(
            state.change(&spec, "missing", "x".into()),
            Err(FormError::UnknownField("missing".into()))
        );
        assert!(matches!(
            state.change(&spec, "agree", "yes".into()),
            Err(FormError::ValueKind { .. })
        ));
    }

    #[test]
    fn reset_clears_an_unresolved_submission() {
        let spec = spec();
        let mut state = FormState::new(&spec);
        assert!(matches!(
            crate::submit::begin(&spec, &mut state),
            crate::submit::Begin::Ready(_)
        ));
        assert!(state.is_locked(&spec));

        state.reset(&spec);
        assert_eq!(state.phase(), SubmissionPhase::Idle);
        assert!(!state.is_locked(&spec));
    }

    #[test]
    fn reset_restores_defaults() {
        let spec = spec();
        let mut state = FormState::new(&spec);
        state.change(&spec, "name", "".into()).expect("change");
        state.blur(&spec, "name").expect("blur");
        state.reset(&spec);
        assert_eq!(state.value("name"), Some(&FieldValue::from("Ada")));
        assert_eq!(state.touched_fields().count(), 0);
        assert_eq!(state.errors().count(), 0);
    }
}
