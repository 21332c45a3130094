//! Bearer credentials shared by every upstream call.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::Utc;

/// An upstream API token and its optional expiry.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    token: String,
    /// Fractional unix epoch seconds
    expires_at: Option<f64>,
}

impl Credentials {
    pub fn new(token: impl Into<String>, expires_at: Option<f64>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> Option<f64> {
        self.expires_at
    }

    /// `Authorization` header value for this token.
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Whether the token has expired at `now` (epoch seconds).
    ///
    /// `None` when the upstream never told us an expiry.
    pub fn is_expired_at(&self, now: f64) -> Option<bool> {
        self.expires_at.map(|expires_at| now >= expires_at)
    }

    /// Whether the token has expired by the wall clock.
    pub fn is_expired(&self) -> Option<bool> {
        let now = Utc::now().timestamp_micros() as f64 / 1_000_000.0;
        self.is_expired_at(now)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Process-wide holder of the current credentials.
///
/// Readers take an `Arc` snapshot with [`TokenStore::snapshot`] once per call
/// and build headers from it, so a concurrent [`TokenStore::replace`] can
/// never be observed half-way. Writers swap the whole value atomically.
#[derive(Clone, Default)]
pub struct TokenStore {
    inner: Arc<ArcSwapOption<Credentials>>,
}

impl TokenStore {
    pub fn new(initial: Option<Credentials>) -> Self {
        Self {
            inner: Arc::new(ArcSwapOption::new(initial.map(Arc::new))),
        }
    }

    /// Current credentials, if any.
    pub fn snapshot(&self) -> Option<Arc<Credentials>> {
        self.inner.load_full()
    }

    /// Replace the held credentials, returning the previous ones.
    pub fn replace(&self, credentials: Credentials) -> Option<Arc<Credentials>> {
        let previous = self.inner.swap(Some(Arc::new(credentials)));
        crate::metrics::set_token_present(true);
        previous
    }

    pub fn is_present(&self) -> bool {
        self.inner.load().is_some()
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("present", &self.is_present())
            .finish()
    }
}
