use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

/// Current values keyed by field name.
pub type FormValues = BTreeMap<String, FieldValue>;

/// Where the bytes of a selected file live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    Memory(Arc<[u8]>),
    /// Read lazily when the payload is encoded.
    Path(PathBuf),
}

/// Handle to a user selected file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub name: String,
    pub media_type: String,
    pub size: u64,
    #[serde(skip)]
    pub source: FileSource,
}

impl FileRef {
    pub fn from_bytes(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            name: name.into(),
            media_type: media_type.into(),
            size: bytes.len() as u64,
            source: FileSource::Memory(Arc::from(bytes)),
        }
    }

    /// Reference a file on disk; its size is taken from the metadata.
    pub async fn open(path: impl AsRef<Path>, media_type: impl Into<String>) -> io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            name,
            media_type: media_type.into(),
            size: metadata.len(),
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    pub async fn read(&self) -> io::Result<Vec<u8>> {
        match &self.source {
            FileSource::Memory(bytes) => Ok(bytes.to_vec()),
            FileSource::Path(path) => tokio::fs::read(path).await,
        }
    }
}

/// Value held by one field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Empty,
    Bool(bool),
    Text(String),
    File(FileRef),
    Files(Vec<FileRef>),
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        FieldValue::Text(text.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(text: String) -> Self {
        FieldValue::Text(text)
    }
}

impl From<bool> for FieldValue {
    fn from(flag: bool) -> Self {
        FieldValue::Bool(flag)
    }
}

impl From<FileRef> for FieldValue {
    fn from(file: FileRef) -> Self {
        FieldValue::File(file)
    }
}

impl FieldValue {
    /// Converts a JSON literal. Numbers become their text form, as an input element would hold them.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Empty,
            Value::Bool(flag) => FieldValue::Bool(*flag),
            Value::String(text) => FieldValue::Text(text.clone()),
            Value::Number(number) => FieldValue::Text(number.to_string()),
            other => FieldValue::Text(other.to_string()),
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            FieldValue::Empty => "empty",
            FieldValue::Bool(_) => "boolean",
            FieldValue::Text(_) => "text",
            FieldValue::File(_) => "file",
            FieldValue::Files(_) => "file list",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn files(&self) -> Vec<&FileRef> {
        match self {
            FieldValue::File(file) => vec![file],
            FieldValue::Files(files) => files.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Whether the value counts as "filled in".
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Empty => false,
            FieldValue::Bool(flag) => *flag,
            FieldValue::Text(text) => !text.is_empty(),
            FieldValue::File(_) => true,
            FieldValue::Files(files) => !files.is_empty(),
        }
    }

    /// Sequence length used by length rules: characters for text, entries for file lists.
    pub fn length(&self) -> Option<usize> {
        match self {
            FieldValue::Text(text) => Some(text.chars().count()),
            FieldValue::Files(files) => Some(files.len()),
            _ => None,
        }
    }

    /// Numeric reading used by range rules; NaN when not a finite decimal number.
    pub fn to_number(&self) -> f64 {
        match self {
            FieldValue::Text(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|number| number.is_finite())
                .unwrap_or(f64::NAN),
            FieldValue::Bool(true) => 1.0,
            FieldValue::Bool(false) => 0.0,
            _ => f64::NAN,
        }
    }

    /// Strict equality against a configured JSON literal; no type coercion.
    pub fn equals_json(&self, other: &Value) -> bool {
        match (self, other) {
            (FieldValue::Empty, Value::Null) => true,
            (FieldValue::Bool(flag), Value::Bool(expected)) => flag == expected,
            (FieldValue::Text(text), Value::String(expected)) => text == expected,
            _ => false,
        }
    }

    /// Containment check; `None` when the value does not support containment.
    pub fn contains_json(&self, needle: &Value) -> Option<bool> {
        let text = self.as_text()?;
        let needle = match needle {
            Value::String(needle) => needle.clone(),
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            _ => return Some(false),
        };
        Some(text.contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness_mirrors_input_semantics() {
        assert!(!FieldValue::Empty.is_truthy());
        assert!(!FieldValue::Text(String::new()).is_truthy());
        assert!(!FieldValue::Bool(false).is_truthy());
        assert!(!FieldValue::Files(Vec::new()).is_truthy());
        assert!(FieldValue::from("x").is_truthy());
        assert!(FieldValue::from(FileRef::from_bytes("a.txt", "text/plain", b"a".to_vec())).is_truthy());
    }

    #[test]
    fn numbers_parse_from_trimmed_text() {
        assert_eq!(FieldValue::from(" 12.5 ").to_number(), 12.5);
        assert!(FieldValue::from("").to_number().is_nan());
        assert!(FieldValue::from("abc").to_number().is_nan());
        assert_eq!(FieldValue::Bool(true).to_number(), 1.0);
    }

    #[test]
    fn non_finite_spellings_are_not_numbers() {
        for text in ["inf", "-Infinity", "NaN", "1e400"] {
            assert!(FieldValue::from(text).to_number().is_nan(), "{text}");
        }
    }

    #[test]
    fn json_equality_is_strict() {
        assert!(FieldValue::from("admin").equals_json(&json!("admin")));
        assert!(!FieldValue::from("5").equals_json(&json!(5)));
        assert!(FieldValue::Bool(true).equals_json(&json!(true)));
        assert!(FieldValue::Empty.equals_json(&Value::Null));
    }

    #[test]
    fn containment_fails_closed_for_non_text() {
        assert_eq!(FieldValue::from("hello world").contains_json(&json!("world")), Some(true));
        assert_eq!(FieldValue::Bool(true).contains_json(&json!("t")), None);
        assert_eq!(FieldValue::Empty.contains_json(&json!("")), None);
    }

    #[test]
    fn serializes_files_without_contents() {
        let file = FileRef::from_bytes("cv.pdf", "application/pdf", vec![1, 2, 3]);
        let value = serde_json::to_value(FieldValue::File(file)).expect("serialize");
        assert_eq!(value, json!({ "name": "cv.pdf", "mediaType": "application/pdf", "size": 3 }));
        assert_eq!(serde_json::to_value(FieldValue::Empty).expect("serialize"), Value::Null);
    }

    #[tokio::test]
    async fn open_reads_size_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.TXT");
        std::fs::write(&path, b"hello").expect("write");
        let file = FileRef::open(&path, "text/plain").await.expect("open");
        assert_eq!(file.size, 5);
        assert_eq!(file.name, "notes.TXT");
        assert_eq!(file.read().await.expect("read"), b"hello");
    }
}
