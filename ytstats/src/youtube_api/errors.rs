//! Decoding of YouTube API responses into either a typed payload or a structured status.
//!
//! YouTube reports failures as a JSON envelope of the form
//! `{"error": {"code": 400, "message": "...", "errors": [{"reason": "keyInvalid"}]}}`,
//! irrespective of which endpoint was called. Every page fetched by this crate goes through
//! [`decode_response`], which yields a uniform [`Status`] on failure.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// The reason YouTube gives when the API key was rejected. Calls rejected this way are not
/// billed against the key's quota.
pub const KEY_INVALID: &str = "keyInvalid";

/// Status message used whenever YouTube could not be reached or its answer made no sense.
pub const FAILED_TO_QUERY: &str = "failedToQueryYouTubeAPI";

/// An outcome code and message, as surfaced to callers.
///
/// Codes follow HTTP semantics. Upstream failures keep the code YouTube reported and the
/// first error reason it gave (or its top-level message if no reason was given).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code} {message}")]
pub struct Status {
    #[serde(rename = "status_code")]
    pub code: u16,
    #[serde(rename = "status_message")]
    pub message: String,
}

impl Status {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn ok() -> Self {
        Self::new(200, "OK")
    }

    /// YouTube could not be reached, or it answered with something we could not decode.
    pub fn failed_to_query() -> Self {
        Self::new(500, FAILED_TO_QUERY)
    }

    pub fn is_ok(&self) -> bool {
        self.code == 200
    }

    /// Whether this is the one rejection YouTube does not bill for.
    pub fn is_key_invalid(&self) -> bool {
        self.message == KEY_INVALID
    }
}

/// The error envelope YouTube wraps every failed request in.
///
/// See: <https://developers.google.com/youtube/v3/docs/errors>
#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: String,
}

impl ErrorBody {
    fn into_status(self) -> Status {
        let message = match self.errors.into_iter().next() {
            Some(detail) if !detail.reason.is_empty() => detail.reason,
            _ => self.message,
        };
        Status::new(self.code, message)
    }
}

/// Checks a response body for a YouTube error envelope.
///
/// Returns the upstream status if the body carries a non-zero error code. A body that isn't
/// JSON at all is reported as [`Status::failed_to_query`].
pub fn check_response(body: &[u8]) -> Result<(), Status> {
    let envelope: ErrorEnvelope = serde_json::from_slice(body).map_err(|e| {
        tracing::warn!(error = %e, "YouTube response is not a JSON document");
        Status::failed_to_query()
    })?;
    if envelope.error.code != 0 {
        return Err(envelope.error.into_status());
    }
    Ok(())
}

/// Decodes a response body into `T`, unless it carries a YouTube error envelope.
///
/// The body is inspected twice: once for the error envelope, and, if there was no error,
/// once more for the payload. A payload that doesn't match `T` is an internal failure.
pub fn decode_response<T: DeserializeOwned>(body: &[u8]) -> Result<T, Status> {
    check_response(body)?;
    serde_json::from_slice(body).map_err(|e| {
        tracing::warn!(error = %e, "YouTube response did not have the expected shape");
        Status::failed_to_query()
    })
}
