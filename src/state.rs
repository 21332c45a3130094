//! Shared application state for Axum handlers.
//!
//! This module provides thread-safe, clonable state that is shared across
//! all request handlers. It includes:
//!
//! - **Upstream client**: The single pooled HTTP client for the upstream API
//! - **Credentials**: The current bearer token, swapped atomically on refresh
//! - **Configuration**: Runtime configuration access
//!
//! # Thread Safety
//!
//! Every component is either an `Arc` or internally reference counted, so
//! cloning the state per request only bumps counters.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use crate::config::Config;
use crate::error::AppResult;
use crate::metrics;
use crate::upstream::{Credentials, TokenStore, UpstreamClient};

/// Shared application state for Axum handlers.
///
/// Created once at start-up; handlers receive clones.
///
/// ```rust,ignore
/// let state = AppState::new(config)?;
/// let app = build_router(state);
/// ```
#[derive(Clone)]
pub struct AppState {
    /// Pooled client for the upstream API
    pub upstream: UpstreamClient,
    /// Current upstream bearer credentials
    pub credentials: TokenStore,
    /// Timestamp when the application started
    pub started_at: Instant,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create application state from configuration.
    ///
    /// Builds the upstream connection pool and seeds the credentials from
    /// `KV_API_TOKEN` when it is set.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the upstream client cannot be built.
    pub fn new(config: Config) -> AppResult<Self> {
        let upstream = UpstreamClient::new(&config)?;

        let initial = config
            .api_token
            .as_ref()
            .map(|token| Credentials::new(token.clone(), None));
        if initial.is_some() {
            info!("Seeded upstream credentials from KV_API_TOKEN");
        } else {
            info!("No KV_API_TOKEN set; call /api/token before using upstream endpoints");
        }
        metrics::set_token_present(initial.is_some());

        Ok(Self {
            upstream,
            credentials: TokenStore::new(initial),
            started_at: Instant::now(),
            config: Arc::new(config),
        })
    }

    /// Timeout for one upstream call.
    ///
    /// A client-requested timeout can only shorten the configured one.
    pub fn upstream_timeout(&self, requested: Option<Duration>) -> Duration {
        let configured = self.upstream.default_timeout();
        requested.map_or(configured, |requested| requested.min(configured))
    }

    /// Get the application uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
