use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// One user-initiated generation. Only built from a non-blank prompt; the
/// prompt is kept exactly as typed.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub id: Uuid,
    pub prompt: String,
    pub model_id: String,
}

impl GenerationRequest {
    pub fn new(prompt: &str, model_id: &str) -> Result<Self, GenerationFailure> {
        if prompt.trim().is_empty() {
            return Err(GenerationFailure::empty_prompt());
        }

        Ok(Self {
            id: Uuid::new_v4(),
            prompt: prompt.to_string(),
            model_id: model_id.to_string(),
        })
    }

    pub fn payload(&self) -> InferencePayload<'_> {
        InferencePayload {
            inputs: &self.prompt,
        }
    }
}

/// Wire body sent to the inference endpoint: `{"inputs": "<prompt>"}`.
#[derive(Debug, Serialize)]
pub struct InferencePayload<'a> {
    pub inputs: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
    Success { image_bytes: Bytes },
    Failure(GenerationFailure),
}

impl GenerationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationResult::Success { .. })
    }

    pub fn image_bytes(&self) -> Option<&Bytes> {
        match self {
            GenerationResult::Success { image_bytes } => Some(image_bytes),
            GenerationResult::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&GenerationFailure> {
        match self {
            GenerationResult::Success { .. } => None,
            GenerationResult::Failure(failure) => Some(failure),
        }
    }
}

impl From<GenerationFailure> for GenerationResult {
    fn from(failure: GenerationFailure) -> Self {
        GenerationResult::Failure(failure)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Blank prompt; nothing was sent.
    EmptyPromptRejected,
    /// No response was received (connect, TLS, DNS, timeout).
    TransportFailure,
    /// The service answered with a non-200 status.
    RemoteRejection,
    /// The service answered 200 but the body is not an image.
    DecodeFailure,
}

/// Serialized flat: `Text` as a JSON string, `Json` as the value itself.
/// `Json` never holds a bare string, so reading it back is lossless.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FailureDetail {
    Json(Value),
    Text(String),
}

impl FailureDetail {
    /// Structured if the body parses as JSON, otherwise lossy UTF-8 text.
    /// A body that is a lone JSON string is kept as its text.
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => value.into(),
            Err(_) => FailureDetail::Text(String::from_utf8_lossy(body).into_owned()),
        }
    }

    /// The `error` field of a `{"error": "..."}` body, if present.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            FailureDetail::Json(value) => value.get("error").and_then(Value::as_str),
            FailureDetail::Text(_) => None,
        }
    }
}

impl From<Value> for FailureDetail {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => FailureDetail::Text(text),
            other => FailureDetail::Json(other),
        }
    }
}

impl<'de> Deserialize<'de> for FailureDetail {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(FailureDetail::from)
    }
}

impl fmt::Display for FailureDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureDetail::Json(value) => write!(f, "{}", value),
            FailureDetail::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationFailure {
    pub kind: FailureKind,
    pub status_code: Option<u16>,
    pub detail: FailureDetail,
}

impl GenerationFailure {
    pub fn empty_prompt() -> Self {
        Self {
            kind: FailureKind::EmptyPromptRejected,
            status_code: None,
            detail: FailureDetail::Text("prompt is empty".to_string()),
        }
    }

    pub fn transport(description: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::TransportFailure,
            status_code: None,
            detail: FailureDetail::Text(description.into()),
        }
    }

    pub fn rejection(status_code: u16, body: &[u8]) -> Self {
        Self {
            kind: FailureKind::RemoteRejection,
            status_code: Some(status_code),
            detail: FailureDetail::from_body(body),
        }
    }

    pub fn decode(status_code: u16, description: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::DecodeFailure,
            status_code: Some(status_code),
            detail: FailureDetail::Text(description.into()),
        }
    }
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{:?} (status {}): {}", self.kind, code, self.detail),
            None => write!(f, "{:?}: {}", self.kind, self.detail),
        }
    }
}
