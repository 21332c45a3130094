//! HTTP middleware for request correlation and deadline propagation.
//!
//! - **Request ID**: Accepts or generates `X-Request-Id` and echoes it back
//! - **Request Timeout**: Parses `X-Request-Timeout` so a caller can shorten
//!   the upstream timeout for its own request
//!
//! # Architecture
//!
//! ```text
//! Request → Request ID → Timeout → Handler → Response
//!               ↓            ↓
//!        X-Request-Id    extension
//! ```

pub mod request_id;
pub mod timeout;

pub use request_id::{REQUEST_ID_HEADER, propagate_request_id};
pub use timeout::{
    MAX_REQUEST_TIMEOUT_MS, MIN_REQUEST_TIMEOUT_MS, REQUEST_TIMEOUT_HEADER, RequestTimeout,
    extract_request_timeout,
};
