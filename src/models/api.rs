use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Token document returned by the upstream auth endpoint.
///
/// `expiresAt` is kept as raw JSON so it can be echoed back to the caller
/// exactly as the upstream sent it.
#[derive(Debug, Deserialize)]
pub struct TokenPayload {
    pub token: String,
    #[serde(rename = "expiresAt", default)]
    pub expires_at: Option<Value>,
}

impl TokenPayload {
    /// Expiry as fractional epoch seconds.
    ///
    /// Accepts a JSON number, a numeric string or an RFC 3339 timestamp;
    /// anything else yields `None`.
    pub fn expires_at_epoch(&self) -> Option<f64> {
        match self.expires_at.as_ref()? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().or_else(|| {
                DateTime::parse_from_rfc3339(s.trim())
                    .ok()
                    .map(|dt| dt.timestamp_micros() as f64 / 1_000_000.0)
            }),
            _ => None,
        }
    }
}

/// Response for `GET /api/token`.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: Option<Value>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Readiness response.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// "ready" when a bearer token is held, "no_token" otherwise
    pub status: String,
    pub token_present: bool,
    /// `None` when no token is held or its expiry is unknown
    pub token_expired: Option<bool>,
    pub environment: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}
