//! Landing page, liveness and readiness endpoints.
//!
//! # Endpoints
//!
//! - `GET /` - Plain HTML page confirming the gateway is up
//! - `GET /health` - Liveness; never touches the upstream
//! - `GET /ready` - Readiness; 503 until an upstream token is held
//!
//! # Health vs Readiness
//!
//! - **Health** (`/health`): Always 200 while the process serves HTTP
//! - **Readiness** (`/ready`): 200 only when resource endpoints can be served

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use chrono::Utc;
use tracing::instrument;

use crate::models::{HealthResponse, ReadinessResponse};
use crate::state::AppState;

const HOME_PAGE: &str = "<!DOCTYPE html>\
<html><head><title>KV Gateway</title></head>\
<body><h1>API is running</h1>\
<p>Sensor and actuator endpoints are served under <code>/api</code>.</p>\
</body></html>";

/// Landing page.
pub async fn home() -> Html<&'static str> {
    Html(HOME_PAGE)
}

/// Liveness endpoint.
///
/// # Response Body
///
/// ```json
/// { "status": "ok" }
/// ```
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness endpoint.
///
/// Returns 200 when a bearer token is held and 503 otherwise. Token expiry
/// is reported but does not affect readiness, since the upstream is the
/// authority on whether a token is still accepted.
///
/// # Response Body
///
/// ```json
/// {
///   "status": "ready",
///   "token_present": true,
///   "token_expired": false,
///   "environment": "prod",
///   "version": "0.1.0",
///   "uptime_seconds": 3600,
///   "timestamp": "2025-01-15T10:30:00Z"
/// }
/// ```
#[instrument(skip(state))]
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let snapshot = state.credentials.snapshot();
    let token_present = snapshot.is_some();
    let token_expired = snapshot.as_deref().and_then(|c| c.is_expired());

    let (status, label) = if token_present {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "no_token")
    };

    (
        status,
        Json(ReadinessResponse {
            status: label.to_string(),
            token_present,
            token_expired,
            environment: state.config.environment.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.uptime_seconds(),
            timestamp: Utc::now(),
        }),
    )
}
