use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Request-level failures. These abort the whole request with a 4xx/5xx
/// status, unlike [`PipelineError`] which only ever fails a single item.
#[derive(Error, Debug)]
pub enum OcrdError {
    #[error("{0}")]
    Validation(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for OcrdError {
    fn into_response(self) -> Response {
        let (status, reason) = match &self {
            OcrdError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            OcrdError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.clone()),
            internal @ (OcrdError::Config(_) | OcrdError::Internal(_)) => {
                tracing::error!(error = %internal, "Request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": true,
            "reason": reason,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, OcrdError>;

/// Closed vocabulary of per-item failures.
///
/// The `Display` form is the `reason` string sent on the wire.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Payload Empty")]
    PayloadEmpty,

    #[error("Invalid Image")]
    InvalidImage,

    #[error("Invalid Base64")]
    InvalidBase64,

    #[error("HTTP Error")]
    HttpError,

    #[error("Recognition Failed")]
    RecognitionFailed,
}
