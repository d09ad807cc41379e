//! Mapping from workspace API responses to [`ApiError`].

use ragops_runtime::{ApiError, ApiErrorKind};
use reqwest::StatusCode;
use serde::Deserialize;

/// Error body shared by the REST APIs.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

pub(crate) fn classify(status: StatusCode, error_code: Option<&str>) -> ApiErrorKind {
    match error_code {
        Some("RESOURCE_DOES_NOT_EXIST") | Some("NOT_FOUND") | Some("ENDPOINT_NOT_FOUND") => {
            return ApiErrorKind::NotFound;
        }
        Some("RESOURCE_ALREADY_EXISTS") | Some("ALREADY_EXISTS") => {
            return ApiErrorKind::AlreadyExists;
        }
        Some("PERMISSION_DENIED") => return ApiErrorKind::PermissionDenied,
        Some("UNAUTHENTICATED") => return ApiErrorKind::Unauthenticated,
        _ => {}
    }
    match status {
        StatusCode::NOT_FOUND => ApiErrorKind::NotFound,
        StatusCode::CONFLICT => ApiErrorKind::AlreadyExists,
        StatusCode::FORBIDDEN => ApiErrorKind::PermissionDenied,
        StatusCode::UNAUTHORIZED => ApiErrorKind::Unauthenticated,
        _ => ApiErrorKind::Other,
    }
}

/// Build an error from a non-success status and its raw body.
pub(crate) fn from_parts(status: StatusCode, body: &str) -> ApiError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let kind = classify(status, parsed.error_code.as_deref());
    let message = match (parsed.error_code, parsed.message) {
        (Some(code), Some(message)) => format!("{}: {}", code, message),
        (None, Some(message)) => message,
        (Some(code), None) => code,
        (None, None) if body.trim().is_empty() => status.to_string(),
        (None, None) => format!("{}: {}", status, body.trim()),
    };
    ApiError::new(kind, message).with_status(status.as_u16())
}

pub(crate) async fn from_response(response: reqwest::Response) -> ApiError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    from_parts(status, &body)
}

pub(crate) fn transport(err: reqwest::Error) -> ApiError {
    ApiError::transport(err.to_string())
}
