//! Sensor endpoints.
//!
//! # Endpoints
//!
//! - `GET /api/all/sensors` - List sensors
//! - `GET /api/sensors/sample/{sensor_id}` - Query samples for one sensor
//!
//! # Sample Query
//!
//! | Param    | Default | Range                          |
//! |----------|---------|--------------------------------|
//! | `skip`   | 0       | 0..=2^53-1                     |
//! | `limit`  | 60      | 1..=2000                       |
//! | `before` | unset   | epoch seconds, exclusive bound |
//! | `after`  | unset   | epoch seconds, exclusive bound |
//! | `sort`   | `desc`  | `asc` or `desc`                |

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde_json::Value;
use tracing::instrument;

use super::proxy::forward;
use crate::error::AppResult;
use crate::middleware::RequestTimeout;
use crate::models::RawSampleQuery;
use crate::state::AppState;
use crate::upstream::UpstreamRequest;
use crate::validation::{normalize_sample_query, parse_resource_id};

/// List all sensors.
#[instrument(skip(state, timeout))]
pub async fn list_sensors(
    State(state): State<AppState>,
    timeout: Option<Extension<RequestTimeout>>,
) -> AppResult<Json<Value>> {
    forward(
        &state,
        timeout,
        UpstreamRequest::get("sensors.list", "/sensors/"),
    )
    .await
}

/// Query samples for one sensor.
///
/// The query is validated and normalized before anything is sent; only the
/// normalized parameters reach the upstream.
///
/// ```bash
/// curl "http://localhost:8000/api/sensors/sample/7?limit=100&sort=asc&after=1700000000"
/// ```
#[instrument(skip(state, timeout))]
pub async fn query_sensor_samples(
    State(state): State<AppState>,
    Path(sensor_id): Path<String>,
    raw: Result<Query<RawSampleQuery>, QueryRejection>,
    timeout: Option<Extension<RequestTimeout>>,
) -> AppResult<Json<Value>> {
    let sensor_id = parse_resource_id(&sensor_id, "sensor_id")?;
    let Query(raw) = raw?;
    let query = normalize_sample_query(&raw)?;

    let request = UpstreamRequest::get("sensors.samples", format!("/sensors/{sensor_id}/samples"))
        .with_query(query.to_query_pairs());

    forward(&state, timeout, request).await
}
