use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::future::try_join_all;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::spec::field::FieldType;
use crate::spec::form::FormSpec;
use crate::value::{FieldValue, FileRef, FormValues};

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// File content as sent to a remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedFile {
    pub name: String,
    pub media_type: String,
    pub size: u64,
    /// `data:<media type>;base64,<content>`
    pub encoded_data: String,
}

/// Reads the file and wraps its content in a base64 data URL.
pub async fn encode_file(file: &FileRef) -> std::io::Result<EncodedFile> {
    let bytes = file.read().await?;
    let media_type = if file.media_type.is_empty() {
        FALLBACK_MEDIA_TYPE
    } else {
        file.media_type.as_str()
    };
    Ok(EncodedFile {
        name: file.name.clone(),
        media_type: file.media_type.clone(),
        size: file.size,
        encoded_data: format!("data:{media_type};base64,{}", STANDARD.encode(bytes)),
    })
}

/// JSON document for the remote path: file fields become encoded records.
///
/// All files are read concurrently; the payload is produced only once every read has finished.
pub async fn remote_payload(spec: &FormSpec, values: &FormValues) -> std::io::Result<Value> {
    let mut document = Map::new();
    let mut pending = Vec::new();

    for (name, value) in values {
        let is_file_field = spec
            .field(name)
            .is_some_and(|field| field.kind == FieldType::File);
        match value {
            FieldValue::File(file) if is_file_field => {
                pending.push(encode_upload(name, Upload::Single(file)));
            }
            FieldValue::Files(files) if is_file_field => {
                pending.push(encode_upload(name, Upload::Many(files)));
            }
            other => {
                document.insert(name.clone(), plain_json(other));
            }
        }
    }

    for (name, encoded) in try_join_all(pending).await? {
        document.insert(name, encoded);
    }

    Ok(Value::Object(document))
}

enum Upload<'a> {
    Single(&'a FileRef),
    Many(&'a [FileRef]),
}

async fn encode_upload(name: &str, upload: Upload<'_>) -> std::io::Result<(String, Value)> {
    let encoded = match upload {
        Upload::Single(file) => serde_json::to_value(encode_file(file).await?)?,
        Upload::Many(files) => serde_json::to_value(try_join_all(files.iter().map(encode_file)).await?)?,
    };
    Ok((name.to_string(), encoded))
}

/// Plain JSON form of a value; files keep only their metadata.
pub fn plain_json(value: &FieldValue) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// JSON view of the raw values, used for logging and local handlers that want a document.
pub fn values_json(values: &FormValues) -> Value {
    Value::Object(
        values
            .iter()
            .map(|(name, value)| (name.clone(), plain_json(value)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::field::FieldSpec;
    use serde_json::json;

    fn spec() -> FormSpec {
        let mut files = FieldSpec::new("attachments", FieldType::File);
        files.multiple = true;
        FormSpec::new(
            "upload",
            vec![
                FieldSpec::new("title", FieldType::Text),
                FieldSpec::new("resume", FieldType::File),
                files,
                FieldSpec::new("subscribe", FieldType::Checkbox),
            ],
        )
    }

    #[tokio::test]
    async fn encodes_single_file_as_data_url() {
        let file = FileRef::from_bytes("hi.txt", "text/plain", b"hi".to_vec());
        let encoded = encode_file(&file).await.expect("encode");
        assert_eq!(encoded.encoded_data, "data:text/plain;base64,aGk=");
        assert_eq!(encoded.size, 2);
    }

    #[tokio::test]
    async fn missing_media_type_falls_back_in_data_url() {
        let file = FileRef::from_bytes("blob", "", vec![0u8]);
        let encoded = encode_file(&file).await.expect("encode");
        assert!(encoded.encoded_data.starts_with("data:application/octet-stream;base64,"));
        assert_eq!(encoded.media_type, "");
    }

    #[tokio::test]
    async fn payload_replaces_only_file_fields() {
        let spec = spec();
        let values = FormValues::from([
            ("title".to_string(), FieldValue::from("Report")),
            (
                "resume".to_string(),
                FieldValue::File(FileRef::from_bytes("cv.pdf", "application/pdf", b"%PDF".to_vec())),
            ),
            (
                "attachments".to_string(),
                FieldValue::Files(vec![
                    FileRef::from_bytes("a.txt", "text/plain", b"a".to_vec()),
                    FileRef::from_bytes("b.txt", "text/plain", b"b".to_vec()),
                ]),
            ),
            ("subscribe".to_string(), FieldValue::Bool(true)),
        ]);

        let payload = remote_payload(&spec, &values).await.expect("payload");
        assert_eq!(payload["title"], "Report");
        assert_eq!(payload["subscribe"], true);
        assert_eq!(payload["resume"]["name"], "cv.pdf");
        assert_eq!(payload["resume"]["mediaType"], "application/pdf");
        assert_eq!(payload["resume"]["size"], 4);
        assert_eq!(payload["resume"]["encodedData"], "data:application/pdf;base64,JVBERg==");
        assert_eq!(payload["attachments"].as_array().map(Vec::len), Some(2));
        assert_eq!(payload["attachments"][1]["encodedData"], "data:text/plain;base64,Yg==");
    }

    #[tokio::test]
    async fn empty_file_field_stays_null() {
        let spec = spec();
        let values = FormValues::from([("resume".to_string(), FieldValue::Empty)]);
        let payload = remote_payload(&spec, &values).await.expect("payload");
        assert_eq!(payload, json!({ "resume": null }));
    }

    #[tokio::test]
    async fn unreadable_file_fails_the_payload() {
        let spec = spec();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gone.txt");
        std::fs::write(&path, b"soon gone").expect("write");
        let file = FileRef::open(&path, "text/plain").await.expect("open");
        std::fs::remove_file(&path).expect("remove");

        let values = FormValues::from([("resume".to_string(), FieldValue::File(file))]);
        assert!(remote_payload(&spec, &values).await.is_err());
    }
}
