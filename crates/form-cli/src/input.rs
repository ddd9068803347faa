use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use form_spec::{FieldValue, FileRef, Form, FormSpec};
use serde_json::Value;

use crate::CliResult;

pub fn load_spec(path: &Path) -> CliResult<FormSpec> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
    let spec = serde_json::from_str(&raw)
        .map_err(|err| format!("{} is not a valid form definition: {}", path.display(), err))?;
    tracing::debug!(path = %path.display(), "loaded form definition");
    Ok(spec)
}

/// Applies a JSON object of `{ field: value }` pairs to the form.
pub fn apply_values(form: &mut Form, path: &Path) -> CliResult<()> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
    let document: Value = serde_json::from_str(&raw)?;
    let Value::Object(entries) = document else {
        return Err(format!("{} must contain a JSON object", path.display()).into());
    };
    for (name, value) in &entries {
        form.change(name, FieldValue::from_json(value))?;
    }
    Ok(())
}

/// `field=path[:media/type]` as given to `--file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileArg {
    pub field: String,
    pub path: PathBuf,
    pub media_type: String,
}

impl FromStr for FileArg {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (field, rest) = raw
            .split_once('=')
            .ok_or_else(|| format!("expected field=path[:media/type], got '{raw}'"))?;
        if field.trim().is_empty() || rest.is_empty() {
            return Err(format!("expected field=path[:media/type], got '{raw}'"));
        }
        let (path, media_type) = match rest.rsplit_once(':') {
            Some((path, media)) if media.contains('/') && !path.is_empty() => {
                (path, media.to_string())
            }
            _ => (rest, String::new()),
        };
        Ok(Self {
            field: field.trim().to_string(),
            path: PathBuf::from(path),
            media_type,
        })
    }
}

/// Opens every `--file` argument and assigns it to its field.
///
/// Several files for one field are collected into a list when the field allows multiple files.
pub async fn apply_files(form: &mut Form, files: &[FileArg]) -> CliResult<()> {
    let mut grouped: Vec<(String, Vec<FileRef>)> = Vec::new();
    for arg in files {
        let file = FileRef::open(&arg.path, arg.media_type.clone())
            .await
            .map_err(|err| format!("failed to open {}: {}", arg.path.display(), err))?;
        match grouped.iter_mut().find(|(field, _)| *field == arg.field) {
            Some((_, refs)) => refs.push(file),
            None => grouped.push((arg.field.clone(), vec![file])),
        }
    }

    for (field, mut refs) in grouped {
        let multiple = form
            .spec()
            .field(&field)
            .is_some_and(|spec| spec.multiple);
        let value = if multiple {
            FieldValue::Files(refs)
        } else if refs.len() == 1 {
            FieldValue::File(refs.remove(0))
        } else {
            return Err(format!("field '{field}' accepts a single file").into());
        };
        form.change(&field, value)?;
    }
    Ok(())
}

/// `Name=value` as given to `--header`.
pub fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("header name is empty in '{raw}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
