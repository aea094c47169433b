use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, JsonRejection};
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::StatusCode;
use axum_extra::extract::QueryRejection;

use crate::error::OcrdError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(OcrdError))]
pub struct AppJson<T>(pub T);

/// Query string with repeated keys collected into lists.
#[derive(FromRequestParts)]
#[from_request(via(axum_extra::extract::Query), rejection(OcrdError))]
pub struct AppQuery<T>(pub T);

/// Raw request body, subject to the route's body limit.
pub struct AppBytes(pub Bytes);

impl<S: Send + Sync> FromRequest<S> for AppBytes {
    type Rejection = OcrdError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Bytes::from_request(req, state)
            .await
            .map(Self)
            .map_err(OcrdError::from)
    }
}

impl From<JsonRejection> for OcrdError {
    fn from(rejection: JsonRejection) -> Self {
        map_json_rejection(rejection)
    }
}

impl From<QueryRejection> for OcrdError {
    fn from(rejection: QueryRejection) -> Self {
        OcrdError::Validation(format!("Invalid query: {rejection}"))
    }
}

impl From<BytesRejection> for OcrdError {
    fn from(rejection: BytesRejection) -> Self {
        map_bytes_rejection(rejection.status(), rejection.body_text())
    }
}

fn map_bytes_rejection(status: StatusCode, message: String) -> OcrdError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        OcrdError::PayloadTooLarge(message)
    } else {
        OcrdError::Internal(format!("Failed to read request body: {message}"))
    }
}

fn map_json_rejection(rejection: JsonRejection) -> OcrdError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let message = err.body_text();
            if let Some(field) = extract_missing_field(&message) {
                OcrdError::Validation(format!("Missing required field: {field}"))
            } else {
                OcrdError::Validation(format!("Invalid JSON: {message}"))
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            OcrdError::Validation(format!("JSON syntax error: {}", err.body_text()))
        }
        JsonRejection::MissingJsonContentType(_) => {
            OcrdError::Validation("Missing `Content-Type: application/json` header".to_string())
        }
        JsonRejection::BytesRejection(err) => map_bytes_rejection(err.status(), err.body_text()),
        _ => OcrdError::Validation(rejection.body_text()),
    }
}

fn extract_missing_field(message: &str) -> Option<&str> {
    let prefix = "missing field `";
    let start = message.find(prefix)? + prefix.len();
    let remaining = message.get(start..)?;
    let end = remaining.find('`')?;
    remaining.get(..end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_is_extracted() {
        assert_eq!(
            extract_missing_field("Failed to deserialize: missing field `url` at line 1"),
            Some("url")
        );
        assert_eq!(extract_missing_field("something else"), None);
    }

    #[test]
    fn oversized_body_maps_to_payload_too_large() {
        let error = map_bytes_rejection(StatusCode::PAYLOAD_TOO_LARGE, "too big".to_string());
        assert!(matches!(error, OcrdError::PayloadTooLarge(_)));

        let error = map_bytes_rejection(StatusCode::BAD_REQUEST, "broken".to_string());
        assert!(matches!(error, OcrdError::Internal(_)));
    }
}
