//! Actuator endpoints.
//!
//! # Endpoints
//!
//! - `GET /api/all/actuators` - List actuators
//! - `GET /api/actuator/{actuator_id}` - Read one actuator
//! - `PUT /api/actuator/{actuator_id}` - Set one actuator's state

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde_json::Value;
use tracing::{debug, instrument};

use super::proxy::forward;
use crate::error::{AppError, AppResult, sanitize_serde_error};
use crate::middleware::RequestTimeout;
use crate::state::AppState;
use crate::upstream::UpstreamRequest;
use crate::validation::parse_resource_id;

/// List all actuators.
#[instrument(skip(state, timeout))]
pub async fn list_actuators(
    State(state): State<AppState>,
    timeout: Option<Extension<RequestTimeout>>,
) -> AppResult<Json<Value>> {
    forward(
        &state,
        timeout,
        UpstreamRequest::get("actuators.list", "/actuators/"),
    )
    .await
}

/// Read one actuator.
#[instrument(skip(state, timeout))]
pub async fn get_actuator(
    State(state): State<AppState>,
    Path(actuator_id): Path<String>,
    timeout: Option<Extension<RequestTimeout>>,
) -> AppResult<Json<Value>> {
    let actuator_id = parse_resource_id(&actuator_id, "actuator_id")?;

    forward(
        &state,
        timeout,
        UpstreamRequest::get("actuators.get", format!("/actuators/{actuator_id}")),
    )
    .await
}

/// Set one actuator's state.
///
/// The body may be any JSON value (`true`, `42`, `{"mode": "eco"}`) and is
/// forwarded unchanged. It is parsed as JSON whatever the `Content-Type`.
///
/// ```bash
/// curl -X PUT -d 'true' http://localhost:8000/api/actuator/4
/// ```
#[instrument(skip(state, timeout, body))]
pub async fn set_actuator(
    State(state): State<AppState>,
    Path(actuator_id): Path<String>,
    timeout: Option<Extension<RequestTimeout>>,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let actuator_id = parse_resource_id(&actuator_id, "actuator_id")?;
    let desired: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::validation("body", sanitize_serde_error(&e)))?;

    debug!(actuator_id, "Forwarding actuator state");

    let request = UpstreamRequest::put("actuators.set", format!("/actuators/{actuator_id}/state"))
        .with_json(desired);

    forward(&state, timeout, request).await
}
