//! Upstream token refresh.
//!
//! `GET /api/token` asks the upstream auth endpoint for a fresh token for the
//! configured team, stores it for all later resource calls and returns it to
//! the caller.

use axum::extract::State;
use axum::{Extension, Json};
use serde_json::Value;
use tracing::{info, instrument};

use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::middleware::RequestTimeout;
use crate::models::{TokenPayload, TokenResponse};
use crate::state::AppState;
use crate::upstream::{Credentials, translate};

/// Fetch, store and return a fresh upstream token.
///
/// On any failure the previously held token (if any) stays in place.
///
/// # Response Body
///
/// ```json
/// { "token": "eyJhbGciOi...", "expiresAt": 1762000000 }
/// ```
#[instrument(skip(state, timeout))]
pub async fn fetch_token(
    State(state): State<AppState>,
    timeout: Option<Extension<RequestTimeout>>,
) -> AppResult<Json<TokenResponse>> {
    let timeout = state.upstream_timeout(timeout.map(|Extension(t)| t.duration));

    let result = refresh(&state, timeout).await;
    metrics::record_token_refresh(if result.is_ok() { "ok" } else { "error" });

    result.map(Json)
}

async fn refresh(state: &AppState, timeout: std::time::Duration) -> AppResult<TokenResponse> {
    let response = state
        .upstream
        .fetch_token(&state.config.team, timeout)
        .await?;
    let payload = parse_token_payload(translate(response.status, response.body)?)?;

    let expires_at = payload.expires_at_epoch();
    state
        .credentials
        .replace(Credentials::new(payload.token.clone(), expires_at));
    info!(team = %state.config.team, ?expires_at, "Upstream token refreshed");

    Ok(TokenResponse {
        token: payload.token,
        expires_at: payload.expires_at,
    })
}

fn parse_token_payload(value: Value) -> AppResult<TokenPayload> {
    let payload: TokenPayload = serde_json::from_value(value)
        .map_err(|e| AppError::Parse(format!("Unexpected token response: {e}")))?;

    if payload.token.is_empty() {
        return Err(AppError::Parse(
            "Unexpected token response: empty token".to_string(),
        ));
    }

    Ok(payload)
}
