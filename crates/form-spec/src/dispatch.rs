use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use thiserror::Error;

use crate::spec::form::{EndpointSpec, HttpMethod};
use crate::value::FormValues;

/// Why a dispatched submission did not succeed.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Form submission failed: {0}")]
    Status(u16),
    #[error("Form submission failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("invalid header '{0}'")]
    Header(String),
    #[error("failed to read file: {0}")]
    Encode(#[source] std::io::Error),
    #[error("failed to serialize payload: {0}")]
    Serialize(#[source] serde_json::Error),
    /// Raised by a caller supplied handler; may carry no message.
    #[error("{0}")]
    Handler(String),
}

impl SubmitError {
    pub fn handler(message: impl Into<String>) -> Self {
        SubmitError::Handler(message.into())
    }

    /// Text for the error banner; `None` when the error has nothing to say.
    pub fn user_message(&self) -> Option<String> {
        let message = self.to_string();
        (!message.trim().is_empty()).then_some(message)
    }
}

/// What a handler receives.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionData {
    /// Raw values, files unencoded. Used when no endpoint is configured.
    Local(FormValues),
    /// Endpoint response body, or the sent payload when the body was not JSON.
    Remote(Value),
}

/// Caller supplied submission handler.
#[async_trait]
pub trait SubmitHandler: Send + Sync {
    async fn submit(&self, data: SubmissionData) -> Result<(), SubmitError>;
}

/// Sends the payload and returns the parsed response, falling back to the payload itself.
pub async fn send_remote(
    client: &reqwest::Client,
    endpoint: &EndpointSpec,
    payload: Value,
) -> Result<Value, SubmitError> {
    let body = serde_json::to_vec(&payload).map_err(SubmitError::Serialize)?;
    let mut request = client
        .request(method(endpoint.method), &endpoint.url)
        .headers(headers(endpoint)?)
        .body(body);
    if let Some(secs) = endpoint.timeout_secs {
        request = request.timeout(Duration::from_secs(secs));
    }

    let response = request.send().await.map_err(SubmitError::Transport)?;
    let status = response.status();
    if !status.is_success() {
        return Err(SubmitError::Status(status.as_u16()));
    }

    let bytes = response.bytes().await.map_err(SubmitError::Transport)?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            tracing::debug!(%err, "endpoint response is not JSON, using submitted payload");
            Ok(payload)
        }
    }
}

fn method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
    }
}

fn headers(endpoint: &EndpointSpec) -> Result<HeaderMap, SubmitError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    for (name, value) in &endpoint.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| SubmitError::Header(name.clone()))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| SubmitError::Header(name.clone()))?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}
