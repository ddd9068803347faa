#![allow(missing_docs)]

pub mod dispatch;
pub mod engine;
pub mod error;
pub mod lint;
pub mod payload;
pub mod render;
pub mod spec;
pub mod state;
pub mod submit;
pub mod validate;
pub mod value;
pub mod visibility;

pub use dispatch::{SubmissionData, SubmitError, SubmitHandler, send_remote};
pub use engine::Form;
pub use error::FormError;
pub use lint::{Issue, Severity, check};
pub use payload::{EncodedFile, encode_file, remote_payload, values_json};
pub use render::{FieldView, FormView, Widget, build_view, render_json_ui, render_text, widget_for};
pub use spec::{
    Condition, CustomOutcome, CustomRule, DependsOn, EndpointSpec, FieldSpec, FieldType,
    FormSettings, FormSpec, HttpMethod, Layout, SelectOption, ValidationRule, ValidationType,
};
pub use state::{Banner, BannerKind, FormState, SubmissionPhase};
pub use submit::{Begin, Dispatcher, Submission, SubmitOutcome, begin, finish};
pub use validate::{FieldError, ValidationReport, validate_all, validate_field};
pub use value::{FieldValue, FileRef, FileSource, FormValues};
pub use visibility::{VisibilityMap, is_visible, resolve_visibility};
