use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable rejection codes the gateway attaches to non-2xx bodies.
/// Codes this client does not know yet decode as `Unknown` instead of
/// failing the whole body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    MissingText,
    TextTooLong,
    MissingTexts,
    TooManyTexts,
    AnalysisError,
    BatchAnalysisError,
    NotFound,
    InternalError,
    #[serde(other)]
    Unknown,
}

/// Rejection body shape: `{"error": "...", "code": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: ErrorCode,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code,
        }
    }
}

#[derive(Debug, Error)]
#[error("{code:?}: {error}")]
pub struct ApiException {
    pub code: ErrorCode,
    pub error: String,
}

impl From<ApiError> for ApiException {
    fn from(value: ApiError) -> Self {
        Self {
            code: value.code,
            error: value.error,
        }
    }
}
