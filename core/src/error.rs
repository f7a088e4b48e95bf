//! Error types for the judge API client.
//!
//! # Design
//! Every non-2xx response collapses into `Http`, carrying the status code
//! and whatever the server managed to say about the failure. The payload
//! is decoded best-effort: a JSON body keeps its `message`/`error` fields,
//! a non-empty text body becomes a synthetic `{ message }`, an empty body
//! carries nothing. Views therefore see one failure shape regardless of
//! which endpoint misbehaved.

use serde::Deserialize;
use thiserror::Error;

use crate::http::{HttpResponse, TransportError};

/// Best-effort decoded body of a failed response. Backends in the wild put
/// the human-readable text under either `message` or `error`; unknown
/// extra fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorPayload {
    /// The message the server offered, if any. `message` wins over `error`
    /// when both are present.
    pub fn text(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }
}

/// Errors returned by `JudgeClient` parse methods and `SessionStore`
/// operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("{}", display_message(.payload))]
    Http {
        status: u16,
        payload: Option<ErrorPayload>,
    },

    /// The round-trip failed before a status code existed.
    #[error("network failure: {0}")]
    Transport(String),

    /// The request payload could not be encoded as JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be decoded into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

fn display_message(payload: &Option<ErrorPayload>) -> &str {
    payload
        .as_ref()
        .and_then(ErrorPayload::text)
        .unwrap_or("request failed")
}

impl ApiError {
    /// Build `Http` from a non-success response, sniffing the payload by
    /// content type.
    pub(crate) fn from_response(response: &HttpResponse) -> Self {
        let payload = if response.is_json() {
            serde_json::from_str(&response.body).ok()
        } else if response.body.trim().is_empty() {
            None
        } else {
            Some(ErrorPayload {
                error: None,
                message: Some(response.body.clone()),
            })
        };
        ApiError::Http {
            status: response.status,
            payload,
        }
    }

    /// HTTP status code, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::Transport(err.0)
    }
}
