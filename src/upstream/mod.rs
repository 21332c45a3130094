//! Client for the upstream sensor/actuator REST API.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       UpstreamClient                         │
//! │  ┌──────────────────┐  ┌──────────────────────────────────┐  │
//! │  │ reqwest::Client  │  │ Operations                       │  │
//! │  │ (one pool per    │  │ - call(UpstreamRequest, token)   │  │
//! │  │  process)        │  │ - fetch_token(team)              │  │
//! │  └──────────────────┘  └──────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Structure
//!
//! - `credentials` - Atomically swappable bearer token store
//! - `request` - Call descriptors (`UpstreamRequest`) and raw responses
//! - `translate` - Status/body to JSON-or-error mapping
//!
//! # Failure Handling
//!
//! Calls are single-shot: no retries and no caching. Every call is bounded by
//! a total timeout. Transport failures are reported as
//! [`AppError::UpstreamUnreachable`]; upstream statuses are left for
//! [`translate`] to interpret.

mod credentials;
mod request;
mod translate;

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::metrics;

pub use credentials::{Credentials, TokenStore};
pub use request::{UpstreamMethod, UpstreamRequest, UpstreamResponse};
pub use translate::translate;

/// Resource label used for token fetches in logs and metrics.
pub const TOKEN_RESOURCE: &str = "auth.token";

/// Pooled HTTP client bound to one upstream host.
///
/// Cheap to clone: clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: Client,
    /// API root without a trailing slash; resource paths start with `/`
    api_url: Arc<str>,
    auth_url: Arc<str>,
    default_timeout: Duration,
}

impl UpstreamClient {
    /// Build the client and its connection pool from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the HTTP client cannot be built.
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(config.upstream_timeout)
            .connect_timeout(config.upstream_connect_timeout)
            .pool_max_idle_per_host(config.upstream_pool_max_idle_per_host)
            .pool_idle_timeout(config.upstream_pool_idle_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build upstream client: {e}")))?;

        Ok(Self {
            http,
            api_url: Arc::from(config.upstream_api_url.trim_end_matches('/')),
            auth_url: Arc::from(config.upstream_auth_url.as_str()),
            default_timeout: config.upstream_timeout,
        })
    }

    /// Configured total timeout for a single call.
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    fn resource_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.api_url, path)
        } else {
            format!("{}/{}", self.api_url, path)
        }
    }

    /// Perform an authenticated call against the API root.
    ///
    /// `credentials` is the snapshot taken by the caller; the header is built
    /// from it and nothing else, so a concurrent refresh cannot affect this
    /// call.
    ///
    /// # Errors
    ///
    /// - `AppError::TokenUnavailable` when no credentials are held (nothing is sent)
    /// - `AppError::UpstreamUnreachable` on any transport failure or timeout
    #[instrument(
        skip(self, request, credentials),
        fields(resource = request.resource, method = %request.method, path = %request.path)
    )]
    pub async fn call(
        &self,
        request: UpstreamRequest,
        credentials: Option<Arc<Credentials>>,
        timeout: Duration,
    ) -> AppResult<UpstreamResponse> {
        let credentials = credentials.ok_or(AppError::TokenUnavailable)?;

        if credentials.is_expired() == Some(true) {
            debug!("Using an upstream token past its reported expiry");
        }

        let url = self.resource_url(&request.path);
        let builder = self
            .http
            .request(request.method.into(), &url)
            .header(AUTHORIZATION, credentials.bearer_header())
            .header(CONTENT_TYPE, "application/json");

        debug!(url = %url, "Calling upstream");
        self.execute(request, builder, timeout).await
    }

    /// Request a fresh token from the auth endpoint for `team`.
    ///
    /// This call carries no bearer header.
    #[instrument(skip(self))]
    pub async fn fetch_token(&self, team: &str, timeout: Duration) -> AppResult<UpstreamResponse> {
        let request = UpstreamRequest::post(TOKEN_RESOURCE, &*self.auth_url)
            .with_query(vec![("team", team.to_string())]);
        let builder = self
            .http
            .request(request.method.into(), request.path.as_str());

        debug!(url = %self.auth_url, "Requesting upstream token");
        self.execute(request, builder, timeout).await
    }

    /// Attach the request's query, body and timeout, send it and record the
    /// outcome.
    async fn execute(
        &self,
        request: UpstreamRequest,
        mut builder: reqwest::RequestBuilder,
        timeout: Duration,
    ) -> AppResult<UpstreamResponse> {
        builder = builder.timeout(timeout);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let started = Instant::now();

        let result = async {
            let response = builder
                .send()
                .await
                .map_err(|e| transport_error(&e, timeout))?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| transport_error(&e, timeout))?;
            Ok::<_, AppError>(UpstreamResponse { status, body })
        }
        .await;

        let outcome = match &result {
            Ok(response) if response.status == 200 => "ok",
            Ok(_) => "http_error",
            Err(AppError::UpstreamUnreachable(_)) => "unreachable",
            Err(_) => "error",
        };
        metrics::record_upstream_call(
            request.resource,
            request.method.as_str(),
            outcome,
            started.elapsed().as_secs_f64(),
        );

        match &result {
            Ok(response) => debug!(status = response.status, "Upstream responded"),
            Err(e) => warn!(error = %e, "Upstream call failed"),
        }

        result
    }
}

/// Classify a reqwest failure.
///
/// Anything that happened on the wire is "unreachable"; a request that could
/// not even be built is our own bug.
fn transport_error(error: &reqwest::Error, timeout: Duration) -> AppError {
    if error.is_builder() {
        return AppError::Internal(format!("Invalid upstream request: {error}"));
    }

    if error.is_timeout() {
        return AppError::UpstreamUnreachable(format!("timed out after {timeout:?}"));
    }

    if error.is_connect() {
        return AppError::UpstreamUnreachable(format!("connection failed: {error}"));
    }

    AppError::UpstreamUnreachable(error.to_string())
}
