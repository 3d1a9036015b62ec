//! # Error Handling
//!
//! This module provides unified error handling for the Review Relay service:
//! the domain-level [`RelayError`] taxonomy used throughout the pipeline, and
//! the problem+json [`ApiError`] response format with trace ID propagation.

use axum::{
    extract::rejection::JsonRejection,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::telemetry;

/// Domain-level errors raised by the ingestion and republication pipeline.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Transport-level failure talking to an external service (retried).
    #[error("request to `{op}` failed: {source}")]
    Transport {
        op: String,
        #[source]
        source: reqwest::Error,
    },
    /// Non-2xx response from an external service (retried, then surfaced).
    #[error("`{op}` returned status {status}: {body}")]
    UpstreamStatus { op: String, status: u16, body: String },
    /// A single attempt exceeded its wall-clock budget.
    #[error("operation `{op}` timed out after {seconds}s")]
    Timeout { op: String, seconds: u64 },
    /// Malformed inbound request or record; surfaced immediately, never retried.
    #[error("validation failed: {0}")]
    Validation(String),
    /// An external response did not have the expected shape.
    #[error("malformed upstream payload: {0}")]
    MalformedPayload(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// Domain-level conflict such as a duplicate schedule or product mapping.
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
}

/// Unified API error response structure
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    /// HTTP status code for the response
    #[serde(skip_serializing, skip_deserializing)]
    pub status: StatusCode,
    /// Error code for programmatic handling
    pub code: Box<str>,
    /// Human-readable error message
    pub message: Box<str>,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Box<serde_json::Value>>,
    /// Correlation trace ID for debugging (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Box<str>>,
}

impl ApiError {
    /// Create a new API error with the given status code and message
    pub fn new<S: Into<String>>(status: StatusCode, code: S, message: S) -> Self {
        Self {
            status,
            code: code.into().into_boxed_str(),
            message: message.into().into_boxed_str(),
            details: None,
            trace_id: Self::current_trace_id(),
        }
    }

    /// Add details to the error
    pub fn with_details<V: Into<serde_json::Value>>(mut self, details: V) -> Self {
        self.details = Some(Box::new(details.into()));
        self
    }

    /// Extract current trace ID from the active request context (falls back to
    /// a generated correlation ID).
    fn current_trace_id() -> Option<Box<str>> {
        telemetry::current_trace_id()
            .map(|trace_id| trace_id.into_boxed_str())
            .or_else(|| {
                Some(format!("corr-{}", &uuid::Uuid::new_v4().to_string()[..8]).into_boxed_str())
            })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/problem+json"),
        );

        (self.status, headers, axum::Json(self)).into_response()
    }
}

// Error mappers for common sources

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        tracing::error!("Internal error: {:?}", error);

        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "An internal error occurred",
        )
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON: {}", err),
            JsonRejection::JsonSyntaxError(err) => format!("JSON syntax error: {}", err),
            JsonRejection::MissingJsonContentType(_) => {
                "Missing 'Content-Type: application/json' header".to_string()
            }
            _ => "Invalid request body".to_string(),
        };

        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", &message)
    }
}

fn is_unique_violation(error: &sea_orm::DbErr) -> bool {
    use sea_orm::RuntimeErr;

    const PG_UNIQUE: &str = "23505";
    const SQLITE_DUPLICATE_CODES: &[&str] = &["1555", "2067"];

    let runtime_err = match error {
        sea_orm::DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
        | sea_orm::DbErr::Exec(RuntimeErr::SqlxError(sqlx_err)) => sqlx_err,
        _ => return false,
    };

    let Some(db_error) = runtime_err.as_database_error() else {
        return false;
    };

    if db_error.is_unique_violation() {
        return true;
    }

    match db_error.code() {
        Some(code) => {
            let code_str = code.as_ref();
            code_str == PG_UNIQUE || SQLITE_DUPLICATE_CODES.contains(&code_str)
        }
        None => false,
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(error: sea_orm::DbErr) -> Self {
        if is_unique_violation(&error) {
            tracing::debug!(?error, "Unique constraint violation detected");
            return Self::new(StatusCode::CONFLICT, "CONFLICT", "Resource already exists");
        }

        match error {
            sea_orm::DbErr::RecordNotFound(record) => Self::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                &format!("Record not found: {}", record),
            ),
            other => {
                tracing::error!("Database error: {:?}", other);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Database error occurred",
                )
            }
        }
    }
}

impl From<RelayError> for ApiError {
    fn from(error: RelayError) -> Self {
        match error {
            RelayError::Validation(message) => {
                ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", &message)
            }
            RelayError::NotFound(message) => {
                ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", &message)
            }
            RelayError::Conflict(message) => {
                ApiError::new(StatusCode::CONFLICT, "CONFLICT", &message)
            }
            RelayError::UpstreamStatus { op, status, body } => upstream_error(&op, status, body),
            RelayError::Timeout { ref op, seconds } => {
                tracing::error!(op = %op, seconds, "Upstream call exhausted its time budget");
                ApiError::new(
                    StatusCode::BAD_GATEWAY,
                    "PROVIDER_ERROR",
                    &format!("Operation `{}` timed out", op),
                )
            }
            RelayError::Transport { ref op, ref source } => {
                tracing::error!(op = %op, error = %source, "Upstream transport failure");
                ApiError::new(
                    StatusCode::BAD_GATEWAY,
                    "PROVIDER_ERROR",
                    &format!("Operation `{}` failed", op),
                )
            }
            RelayError::MalformedPayload(message) => {
                tracing::error!(%message, "Malformed upstream payload");
                ApiError::new(
                    StatusCode::BAD_GATEWAY,
                    "PROVIDER_ERROR",
                    "Upstream returned a malformed payload",
                )
            }
            RelayError::Db(db_err) => db_err.into(),
        }
    }
}

/// Create an upstream rejection error with provider metadata in the details.
pub fn upstream_error(op: &str, status: u16, body: String) -> ApiError {
    let snippet = if body.chars().count() > 200 {
        let truncated: String = body.chars().take(200).collect();
        format!("{}...", truncated)
    } else {
        body
    };

    ApiError::new(
        StatusCode::BAD_GATEWAY,
        "PROVIDER_ERROR",
        &format!("Upstream operation `{}` returned status {}", op, status),
    )
    .with_details(json!({ "operation": op, "status": status, "body_snippet": snippet }))
}

/// Create an unauthorized error (401)
pub fn unauthorized(message: Option<&str>) -> ApiError {
    let msg = message.unwrap_or("Authentication required");
    ApiError::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg)
}

/// Create a validation error with field details
pub fn validation_error(message: &str, field_errors: serde_json::Value) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message).with_details(field_errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn api_error_basic() {
        let error = ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "Test error message",
        );

        assert_eq!(error.code, Box::from("VALIDATION_FAILED"));
        assert_eq!(error.message, Box::from("Test error message"));
        assert!(error.details.is_none());
    }

    #[test]
    fn api_error_with_details() {
        let error = ApiError::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", "Test error message")
            .with_details(json!({"field": "value"}));

        assert_eq!(error.details, Some(Box::new(json!({"field": "value"}))));
    }

    #[test]
    fn content_type_header() {
        let error = ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", "Test error");

        let response = error.into_response();

        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/problem+json"
        );
    }

    #[test]
    fn status_code_preserved() {
        let error = ApiError::new(StatusCode::CONFLICT, "CONFLICT", "Resource already exists");

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn trace_id_generated() {
        let error = ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "Test error",
        );

        let trace_id = error.trace_id.expect("trace id should be generated");
        assert!(trace_id.starts_with("corr-"));
        assert_eq!(trace_id.len(), 13);
    }

    #[test]
    fn relay_validation_maps_to_400() {
        let api: ApiError = RelayError::Validation("missing field".to_string()).into();
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.code, Box::from("VALIDATION_FAILED"));
        assert!(api.message.contains("missing field"));
    }

    #[test]
    fn relay_conflict_maps_to_409() {
        let api: ApiError =
            RelayError::Conflict("A schedule already exists for this URL.".to_string()).into();
        assert_eq!(api.status, StatusCode::CONFLICT);
        assert_eq!(api.code, Box::from("CONFLICT"));
    }

    #[test]
    fn relay_upstream_maps_to_502_with_details() {
        let api: ApiError = RelayError::UpstreamStatus {
            op: "provider.job_info".to_string(),
            status: 503,
            body: "service unavailable".to_string(),
        }
        .into();

        assert_eq!(api.status, StatusCode::BAD_GATEWAY);
        assert_eq!(api.code, Box::from("PROVIDER_ERROR"));

        let details = api.details.expect("upstream error should carry details");
        let details = details.as_object().unwrap();
        assert_eq!(details.get("operation").unwrap(), "provider.job_info");
        assert_eq!(details.get("status").unwrap(), 503);
    }

    #[test]
    fn relay_timeout_maps_to_502() {
        let api: ApiError = RelayError::Timeout {
            op: "analytics.push_batch".to_string(),
            seconds: 30,
        }
        .into();

        assert_eq!(api.status, StatusCode::BAD_GATEWAY);
        assert_eq!(api.code, Box::from("PROVIDER_ERROR"));
    }

    #[test]
    fn upstream_body_snippet_truncated_on_char_boundary() {
        let body = "测试中文字符 long upstream body ".repeat(20);
        let api = upstream_error("provider.reviews", 500, body.clone());

        let details = api.details.unwrap();
        let snippet = details
            .as_object()
            .unwrap()
            .get("body_snippet")
            .unwrap()
            .as_str()
            .unwrap();

        assert!(snippet.chars().count() <= 203);
        if body.chars().count() > 200 {
            assert!(snippet.ends_with("..."));
        }
    }

    #[test]
    fn database_not_found_maps_to_404() {
        let db_error = sea_orm::DbErr::RecordNotFound("schedule 42".to_string());
        let api: ApiError = db_error.into();

        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert!(api.message.contains("schedule 42"));
    }
}
