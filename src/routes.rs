//! Application routing configuration with middleware stack.
//!
//! # Middleware Stack (applied in order)
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────┐
//! │   Request ID     │ ← Adds X-Request-Id header
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │     Tracing      │ ← HTTP request/response logging
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │      CORS        │ ← Cross-origin headers, answers preflights
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │ Client Deadline  │ ← Parses X-Request-Timeout
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │   Body Limit     │ ← 413 if exceeded
//! └────────┬─────────┘
//!          │
//!          ▼
//!      Handler
//! ```
//!
//! # Route Groups
//!
//! - `/`, `/health`, `/ready` - Landing page and probes (no upstream call)
//! - `/api/all/sensors`, `/api/sensors/sample/{sensor_id}` - Sensors
//! - `/api/all/actuators`, `/api/actuator/{actuator_id}` - Actuators
//! - `/api/token` - Upstream token refresh

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::from_fn;
use axum::routing::get;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::handlers;
use crate::middleware::{REQUEST_ID_HEADER, extract_request_timeout, propagate_request_id};
use crate::state::AppState;

/// Build the application router with all routes and middleware configured.
///
/// # Arguments
///
/// * `state` - Application state containing config and the upstream client
///
/// # Returns
///
/// Fully configured Axum router ready to be served.
pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    let cors = build_cors_layer(&config.cors_allowed_origins);

    let mut router = Router::new()
        // Landing page and probes
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        // Sensors
        .route("/api/all/sensors", get(handlers::list_sensors))
        .route(
            "/api/sensors/sample/{sensor_id}",
            get(handlers::query_sensor_samples),
        )
        // Actuators
        .route("/api/all/actuators", get(handlers::list_actuators))
        .route(
            "/api/actuator/{actuator_id}",
            get(handlers::get_actuator).put(handlers::set_actuator),
        )
        // Token
        .route("/api/token", get(handlers::fetch_token));

    // =========================================================================
    // Apply Middleware Stack (order matters - applied bottom to top)
    // =========================================================================

    // 1. Request body size limit
    info!(
        max_size_bytes = config.max_request_body_size,
        "Request body size limit configured"
    );
    router = router.layer(DefaultBodyLimit::max(config.max_request_body_size));

    // 2. Client deadline
    router = router.layer(from_fn(extract_request_timeout));

    // 3. CORS
    router = router.layer(cors);

    // 4. Tracing
    router = router.layer(TraceLayer::new_for_http());

    // 5. Request ID (outermost, so every log line carries it)
    router = router.layer(from_fn(propagate_request_id));

    router.with_state(state)
}

/// Build CORS layer from configuration.
///
/// Credentials are allowed, so wildcards cannot be sent back: methods and
/// headers are mirrored from the preflight, and `*` in `allowed_origins`
/// mirrors the request origin.
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_any = allowed_origins.iter().any(|o| o == "*");

    let origin = if allow_any {
        warn!("CORS allows any origin with credentials; restrict CORS_ALLOWED_ORIGINS in production");
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %o, "Ignoring unparseable CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
}
