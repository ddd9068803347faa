use crate::spec::field::{Condition, FieldSpec};
use crate::spec::form::FormSpec;
use crate::value::{FieldValue, FormValues};

pub type VisibilityMap = std::collections::BTreeMap<String, bool>;

/// Whether `field` is shown given the current values.
pub fn is_visible(field: &FieldSpec, values: &FormValues) -> bool {
    let Some(depends_on) = &field.depends_on else {
        return true;
    };
    let empty = FieldValue::Empty;
    let current = values.get(&depends_on.field).unwrap_or(&empty);

    match depends_on.condition {
        Condition::Equals => current.equals_json(&depends_on.value),
        Condition::NotEquals => !current.equals_json(&depends_on.value),
        Condition::Contains => current.contains_json(&depends_on.value).unwrap_or(false),
        Condition::NotEmpty => current.is_truthy(),
        Condition::Unknown => {
            tracing::debug!(
                field = %field.name,
                depends_on = %depends_on.field,
                "unknown dependency condition, showing field"
            );
            true
        }
    }
}

pub fn resolve_visibility(spec: &FormSpec, values: &FormValues) -> VisibilityMap {
    spec.fields
        .iter()
        .map(|field| (field.name.clone(), is_visible(field, values)))
        .collect()
}
