use std::sync::Arc;

use crate::dispatch::{SubmissionData, SubmitError, SubmitHandler, send_remote};
use crate::payload::remote_payload;
use crate::spec::form::FormSpec;
use crate::state::{Banner, BannerKind, FormState, SubmissionPhase};
use crate::validate::{ValidationReport, validate_all};
use crate::value::FormValues;

/// Result of one submit trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Another submission is running or the form is disabled.
    Ignored,
    /// At least one field failed validation; nothing was dispatched.
    Invalid(ValidationReport),
    Succeeded,
    /// Dispatch failed; carries the banner text.
    Failed(String),
}

/// First step of a submit trigger.
#[derive(Debug)]
pub enum Begin {
    Ignored,
    Invalid(ValidationReport),
    Ready(Submission),
}

/// Validates every declared field and, when clean, moves the form to `Submitting`.
pub fn begin(spec: &FormSpec, state: &mut FormState) -> Begin {
    if state.is_locked(spec) {
        tracing::debug!(form = %spec.id, phase = state.phase().as_str(), "submit ignored");
        return Begin::Ignored;
    }

    state.set_phase(SubmissionPhase::Validating);
    let report = validate_all(spec, state.values());
    state.apply_report(&report);
    state.touch_all();

    if !report.valid {
        tracing::debug!(form = %spec.id, errors = report.errors.len(), "submission blocked by validation");
        state.set_phase(SubmissionPhase::Idle);
        return Begin::Invalid(report);
    }

    state.set_banner(None);
    state.set_phase(SubmissionPhase::Submitting);
    Begin::Ready(Submission {
        values: state.values().clone(),
    })
}

/// Values captured when a submission left validation.
#[derive(Debug, Clone)]
pub struct Submission {
    values: FormValues,
}

impl Submission {
    pub fn values(&self) -> &FormValues {
        &self.values
    }

    /// Performs exactly one dispatch: the endpoint when configured, otherwise the handler.
    pub async fn dispatch(&self, spec: &FormSpec, dispatcher: &Dispatcher) -> Result<(), SubmitError> {
        match (&spec.settings.endpoint, &dispatcher.handler) {
            (Some(endpoint), handler) => {
                let payload = remote_payload(spec, &self.values)
                    .await
                    .map_err(SubmitError::Encode)?;
                tracing::debug!(form = %spec.id, url = %endpoint.url, method = endpoint.method.as_str(), "sending submission");
                let result = send_remote(&dispatcher.client, endpoint, payload).await?;
                if let Some(handler) = handler {
                    handler.submit(SubmissionData::Remote(result)).await?;
                }
                Ok(())
            }
            (None, Some(handler)) => {
                handler
                    .submit(SubmissionData::Local(self.values.clone()))
                    .await
            }
            (None, None) => {
                tracing::warn!(form = %spec.id, "no endpoint or submit handler configured");
                Ok(())
            }
        }
    }
}

/// Resolves a dispatched submission into a terminal phase.
pub fn finish(
    spec: &FormSpec,
    state: &mut FormState,
    result: Result<(), SubmitError>,
) -> SubmitOutcome {
    let settings = &spec.settings;
    match result {
        Ok(()) => {
            tracing::info!(form = %spec.id, "form submitted");
            if settings.reset_on_submit {
                state.clear_fields(spec);
            }
            let banner = settings.show_success_message.then(|| Banner {
                kind: BannerKind::Success,
                text: settings.success_message.clone(),
            });
            state.set_banner(banner);
            state.set_phase(SubmissionPhase::Succeeded);
            SubmitOutcome::Succeeded
        }
        Err(err) => {
            tracing::error!(form = %spec.id, error = %err, "form submission failed");
            let text = err
                .user_message()
                .unwrap_or_else(|| settings.error_message.clone());
            state.set_banner(Some(Banner {
                kind: BannerKind::Error,
                text: text.clone(),
            }));
            state.set_phase(SubmissionPhase::Failed);
            SubmitOutcome::Failed(text)
        }
    }
}

/// Transport and handler used to dispatch submissions.
#[derive(Clone, Default)]
pub struct Dispatcher {
    client: reqwest::Client,
    handler: Option<Arc<dyn SubmitHandler>>,
}

impl Dispatcher {
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_handler(mut self, handler: Arc<dyn SubmitHandler>) -> Self {
        self.handler = Some(handler);
        self
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handler", &self.handler.is_some())
            .finish()
    }
}
