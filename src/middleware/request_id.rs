//! Request ID propagation.
//!
//! Every request gets an `X-Request-Id`: the caller's own value when it sent a
//! non-empty one, a fresh UUIDv4 otherwise. The ID is written back onto the
//! request (so handlers and logs see it) and onto the response.
//!
//! ```bash
//! curl -H "X-Request-Id: dashboard-42" http://localhost:8000/api/all/sensors
//! ```

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{Instrument, debug, info_span};
use uuid::Uuid;

/// Header name for request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware that assigns and echoes the request ID.
pub async fn propagate_request_id(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .filter(|value| value.to_str().is_ok_and(|s| !s.is_empty()))
        .cloned()
        .unwrap_or_else(generate_request_id);

    request
        .headers_mut()
        .insert(REQUEST_ID_HEADER, request_id.clone());

    let span = info_span!(
        "request",
        request_id = %request_id.to_str().unwrap_or("unknown")
    );

    let mut response = async {
        debug!("Processing request");
        next.run(request).await
    }
    .instrument(span)
    .await;

    response.headers_mut().insert(REQUEST_ID_HEADER, request_id);
    response
}

fn generate_request_id() -> HeaderValue {
    // A hyphenated UUID is always a valid header value.
    HeaderValue::from_str(&Uuid::new_v4().to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
}
