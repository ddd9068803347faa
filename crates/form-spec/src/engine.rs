use std::collections::HashSet;
use std::sync::Arc;

use crate::dispatch::SubmitHandler;
use crate::error::FormError;
use crate::render::{FormView, build_view};
use crate::spec::form::FormSpec;
use crate::state::FormState;
use crate::submit::{Begin, Dispatcher, SubmitOutcome, begin, finish};
use crate::value::FieldValue;
use crate::visibility::{VisibilityMap, is_visible, resolve_visibility};

type Hook = Arc<dyn Fn() + Send + Sync>;

/// One live form: its definition, state and submission wiring.
pub struct Form {
    spec: FormSpec,
    state: FormState,
    dispatcher: Dispatcher,
    on_success: Option<Hook>,
    on_cancel: Option<Hook>,
}

impl Form {
    pub fn new(spec: FormSpec) -> Result<Self, FormError> {
        let mut seen = HashSet::new();
        for field in &spec.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(FormError::DuplicateField(field.name.clone()));
            }
        }
        let state = FormState::new(&spec);
        Ok(Self {
            spec,
            state,
            dispatcher: Dispatcher::default(),
            on_success: None,
            on_cancel: None,
        })
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.dispatcher = self.dispatcher.with_client(client);
        self
    }

    pub fn with_handler(mut self, handler: impl SubmitHandler + 'static) -> Self {
        self.dispatcher = self.dispatcher.with_handler(Arc::new(handler));
        self
    }

    pub fn on_success(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(hook));
        self
    }

    /// Registers a cancel action; the view then offers a cancel button.
    pub fn on_cancel(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_cancel = Some(Arc::new(hook));
        self.spec.settings.cancellable = true;
        self
    }

    pub fn spec(&self) -> &FormSpec {
        &self.spec
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn change(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), FormError> {
        self.state.change(&self.spec, name, value.into())
    }

    pub fn blur(&mut self, name: &str) -> Result<Option<&str>, FormError> {
        self.state.blur(&self.spec, name)
    }

    pub fn reset(&mut self) {
        self.state.reset(&self.spec);
    }

    pub fn is_visible(&self, name: &str) -> Result<bool, FormError> {
        let field = self
            .spec
            .field(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        Ok(is_visible(field, self.state.values()))
    }

    pub fn visibility(&self) -> VisibilityMap {
        resolve_visibility(&self.spec, self.state.values())
    }

    /// Runs the cancel hook. Returns whether it ran.
    pub fn cancel(&self) -> bool {
        if self.state.is_locked(&self.spec) {
            return false;
        }
        match &self.on_cancel {
            Some(hook) => {
                hook();
                true
            }
            None => false,
        }
    }

    /// Validates, dispatches and resolves one submission.
    ///
    /// Dropping the returned future mid-dispatch leaves the form `Idle` with its values intact.
    pub async fn submit(&mut self) -> SubmitOutcome {
        let submission = match begin(&self.spec, &mut self.state) {
            Begin::Ignored => return SubmitOutcome::Ignored,
            Begin::Invalid(report) => return SubmitOutcome::Invalid(report),
            Begin::Ready(submission) => submission,
        };

        let in_flight = InFlight {
            state: &mut self.state,
        };
        let result = submission.dispatch(&self.spec, &self.dispatcher).await;
        let outcome = finish(&self.spec, &mut *in_flight.state, result);

        if outcome == SubmitOutcome::Succeeded
            && let Some(hook) = &self.on_success
        {
            hook();
        }
        outcome
    }

    pub fn view(&self) -> FormView {
        build_view(&self.spec, &self.state)
    }
}

/// Holds the state while a dispatch is pending and releases it if the dispatch is dropped.
struct InFlight<'a> {
    state: &'a mut FormState,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state.abandon_submission();
    }
}
