//! The normalize → call → translate composition shared by resource handlers.

use axum::{Extension, Json};
use serde_json::Value;

use crate::error::AppResult;
use crate::middleware::RequestTimeout;
use crate::state::AppState;
use crate::upstream::{UpstreamRequest, translate};

/// Send `request` upstream with the current token snapshot and translate the
/// answer.
pub(super) async fn forward(
    state: &AppState,
    timeout: Option<Extension<RequestTimeout>>,
    request: UpstreamRequest,
) -> AppResult<Json<Value>> {
    let timeout = state.upstream_timeout(timeout.map(|Extension(t)| t.duration));
    let credentials = state.credentials.snapshot();

    let response = state.upstream.call(request, credentials, timeout).await?;

    translate(response.status, response.body).map(Json)
}
