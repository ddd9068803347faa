pub mod field;
pub mod form;
pub mod rule;

pub use field::{Condition, DependsOn, FieldSpec, FieldType, SelectOption};
pub use form::{EndpointSpec, FormSettings, FormSpec, HttpMethod, Layout};
pub use rule::{CustomOutcome, CustomRule, ValidationRule, ValidationType};
