use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Gateway-wide error types with appropriate HTTP status codes.
///
/// # Upstream Errors
///
/// Failures talking to the upstream API are split by cause so callers can
/// tell them apart:
///
/// - `Upstream` - The upstream answered, but not with 200 (status preserved)
/// - `Parse` - The upstream answered 200 with a body that is not JSON
/// - `UpstreamUnreachable` - No answer at all (DNS, refused, timeout, reset)
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Upstream request failed ({status}): {detail}")]
    Upstream { status: u16, detail: String },

    #[error("Failed to parse upstream response: {0}")]
    Parse(String),

    #[error("Upstream API is unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("No upstream API token available")]
    TokenUnavailable,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a validation failure on a named field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// HTTP status used for the outward response.
    ///
    /// Upstream statuses are passed through unchanged; a status the `http`
    /// crate refuses is reported as 502.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::Parse(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
            AppError::TokenUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ConfigError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body for API endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = match self {
            AppError::Validation { field, message } => ErrorResponse {
                error: "validation_error".to_string(),
                message: format!("Invalid {field}: {message}"),
                details: None,
                field: Some(field),
            },
            // The upstream body is what the caller needs to act on, so it is
            // surfaced verbatim.
            AppError::Upstream { status, detail } => ErrorResponse {
                error: "upstream_error".to_string(),
                message: format!("Upstream request failed with status {status}"),
                details: Some(detail),
                field: None,
            },
            AppError::Parse(_) => ErrorResponse {
                error: "parse_error".to_string(),
                message: "Upstream returned a response that could not be parsed.".to_string(),
                details: None,
                field: None,
            },
            AppError::UpstreamUnreachable(_) => ErrorResponse {
                error: "upstream_unreachable".to_string(),
                message: "Upstream API is unreachable. Please try again later.".to_string(),
                details: None,
                field: None,
            },
            AppError::TokenUnavailable => ErrorResponse {
                error: "token_unavailable".to_string(),
                message: "No upstream API token is available. Request one via /api/token."
                    .to_string(),
                details: None,
                field: None,
            },
            AppError::ConfigError(_) => ErrorResponse {
                error: "config_error".to_string(),
                message: "Service configuration error. Please contact support.".to_string(),
                details: None,
                field: None,
            },
            AppError::Internal(_) => ErrorResponse {
                error: "internal_error".to_string(),
                message: "An internal error occurred. Please contact support if the issue persists."
                    .to_string(),
                details: None,
                field: None,
            },
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Sanitize serde error messages to avoid leaking internal type information.
///
/// Used when a caller-supplied JSON body cannot be parsed.
pub fn sanitize_serde_error(e: &serde_json::Error) -> String {
    if e.is_eof() {
        return "Request body is empty or truncated".to_string();
    }

    if e.is_syntax() {
        return format!(
            "Malformed JSON in request body at line {} column {}",
            e.line(),
            e.column()
        );
    }

    "Invalid request format".to_string()
}

/// A query string the extractor could not deserialize (e.g. `?limit=1&limit=2`)
/// is a validation error on the named parameter, or on `query` when serde
/// does not name one.
impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        let text = rejection.body_text();
        let field = rejected_field(&text).unwrap_or("query").to_string();
        let message = text
            .strip_prefix("Failed to deserialize query string: ")
            .unwrap_or(&text)
            .to_string();

        AppError::Validation { field, message }
    }
}

/// First backtick-quoted name in a serde error, e.g. ``duplicate field `limit` ``.
fn rejected_field(text: &str) -> Option<&str> {
    let start = text.find('`')? + 1;
    let rest = text.get(start..)?;
    let end = rest.find('`')?;
    rest.get(..end).filter(|name| !name.is_empty())
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
