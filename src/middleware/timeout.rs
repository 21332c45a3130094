//! Client deadline propagation.
//!
//! A caller may send `X-Request-Timeout: <milliseconds>` to ask for a shorter
//! upstream timeout than the configured one, e.g. a dashboard that polls every
//! few seconds and would rather fail fast than pile up requests.
//!
//! Handlers read the parsed value through the [`RequestTimeout`] extension:
//!
//! ```rust,ignore
//! async fn handler(
//!     State(state): State<AppState>,
//!     timeout: Option<Extension<RequestTimeout>>,
//! ) -> AppResult<Json<Value>> {
//!     let timeout = state.upstream_timeout(timeout.map(|t| t.0.duration));
//!     // ...
//! }
//! ```
//!
//! Values outside `[MIN_REQUEST_TIMEOUT_MS, MAX_REQUEST_TIMEOUT_MS]` and
//! non-numeric values are ignored; the configured timeout applies.

use std::time::Duration;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

/// Minimum accepted client timeout (100ms).
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 100;

/// Maximum accepted client timeout (5 minutes).
pub const MAX_REQUEST_TIMEOUT_MS: u64 = 300_000;

/// Header carrying the client timeout in milliseconds.
pub const REQUEST_TIMEOUT_HEADER: &str = "x-request-timeout";

/// Client-requested timeout, stored in request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTimeout {
    pub duration: Duration,
}

impl RequestTimeout {
    /// Returns `None` if `ms` is outside the accepted range.
    pub fn from_millis(ms: u64) -> Option<Self> {
        (MIN_REQUEST_TIMEOUT_MS..=MAX_REQUEST_TIMEOUT_MS)
            .contains(&ms)
            .then(|| Self {
                duration: Duration::from_millis(ms),
            })
    }

    /// Parse a raw header value.
    pub fn from_header(value: &str) -> Option<Self> {
        value.trim().parse::<u64>().ok().and_then(Self::from_millis)
    }
}

/// Middleware that parses `X-Request-Timeout` into a [`RequestTimeout`]
/// extension.
pub async fn extract_request_timeout(mut request: Request, next: Next) -> Response {
    let raw = request
        .headers()
        .get(REQUEST_TIMEOUT_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    if let Some(raw) = raw {
        match RequestTimeout::from_header(&raw) {
            Some(timeout) => {
                debug!(timeout_ms = %raw.trim(), "Client requested upstream timeout");
                request.extensions_mut().insert(timeout);
            }
            None => debug!(
                value = %raw,
                min = MIN_REQUEST_TIMEOUT_MS,
                max = MAX_REQUEST_TIMEOUT_MS,
                "Ignoring invalid X-Request-Timeout"
            ),
        }
    }

    next.run(request).await
}
