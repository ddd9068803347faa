use thiserror::Error;

/// Misuse of a form instance by its caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("field '{0}' is declared more than once")]
    DuplicateField(String),
    #[error("form has no field named '{0}'")]
    UnknownField(String),
    #[error("field '{field}' of type {kind} cannot hold a {value} value")]
    ValueKind {
        field: String,
        kind: &'static str,
        value: &'static str,
    },
}
