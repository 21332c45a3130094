//! Application configuration loaded from environment variables.
//!
//! # Configuration Hierarchy
//!
//! All configuration is loaded from environment variables with sensible defaults
//! for development. In production, configure via environment variables or a `.env` file.
//!
//! # Upstream Configuration
//!
//! - `UPSTREAM_API_URL`: Root of the sensor/actuator API (default: the KV `/api/v1` root)
//! - `UPSTREAM_AUTH_URL`: Token endpoint (default: the KV `/api/auth/token` endpoint)
//! - `KV_API_TOKEN`: Bearer token to start with (optional; otherwise fetch via `/api/token`)
//! - `KV_TEAM`: Team name sent to the token endpoint (default: `MemoryStackers`)
//!
//! # Performance Tuning
//!
//! - `UPSTREAM_TIMEOUT_SECS`: Total timeout per upstream call (default: 15)
//! - `UPSTREAM_CONNECT_TIMEOUT_SECS`: Connect timeout (default: 5)
//! - `UPSTREAM_POOL_MAX_IDLE_PER_HOST`: Idle pooled connections kept (default: 16)
//! - `UPSTREAM_POOL_IDLE_TIMEOUT_SECS`: Idle connection lifetime (default: 90)

use std::env;
use std::fmt;
use std::time::Duration;

use reqwest::Url;

use crate::error::{AppError, AppResult};

/// Default upstream API root for sensor and actuator resources.
pub const DEFAULT_UPSTREAM_API_URL: &str = "https://makeuc2025.kv.k8s.kinetic-vision.com/api/v1";

/// Default upstream token endpoint.
pub const DEFAULT_UPSTREAM_AUTH_URL: &str =
    "https://makeuc2025.kv.k8s.kinetic-vision.com/api/auth/token";

/// Deployment environment, taken from `ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Read `ENV` from the process environment. Anything other than
    /// `prod`/`production` is treated as development.
    pub fn from_env() -> Self {
        Self::parse(&env::var("ENV").unwrap_or_default())
    }

    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Environment::Production,
            _ => Environment::Development,
        }
    }

    /// Log level used when `RUST_LOG` is not set.
    pub fn default_log_level(self) -> &'static str {
        match self {
            Environment::Development => "info",
            Environment::Production => "warn",
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => f.write_str("dev"),
            Environment::Production => f.write_str("prod"),
        }
    }
}

/// Application configuration loaded from environment variables.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.server_addr());
/// ```
#[derive(Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 8000)
    pub port: u16,

    /// Deployment environment (default: development)
    pub environment: Environment,

    // =========================================================================
    // Upstream Configuration
    // =========================================================================
    /// Root URL that resource paths such as `/sensors/` are appended to
    pub upstream_api_url: String,

    /// Full URL of the upstream token endpoint
    pub upstream_auth_url: String,

    /// Initial bearer token (optional)
    pub api_token: Option<String>,

    /// Team name passed as `team` to the token endpoint
    pub team: String,

    /// Total timeout for a single upstream call (default: 15 seconds)
    pub upstream_timeout: Duration,

    /// TCP/TLS connect timeout for upstream calls (default: 5 seconds)
    pub upstream_connect_timeout: Duration,

    /// Maximum idle pooled connections per upstream host (default: 16)
    pub upstream_pool_max_idle_per_host: usize,

    /// How long an idle pooled connection is kept (default: 90 seconds)
    pub upstream_pool_idle_timeout: Duration,

    // =========================================================================
    // Request Limits
    // =========================================================================
    /// Maximum request body size in bytes (default: 64KB)
    /// Actuator state values are small JSON documents
    pub max_request_body_size: usize,

    // =========================================================================
    // Security Configuration
    // =========================================================================
    /// Allowed CORS origins
    /// Use "*" to mirror any origin (not recommended for production)
    pub cors_allowed_origins: Vec<String>,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Log level (e.g., "info", "debug", "trace")
    pub log_level: String,

    /// Port for Prometheus metrics endpoint (default: 9090, 0 = disabled)
    pub metrics_port: u16,
}

// The token must never end up in logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("upstream_api_url", &self.upstream_api_url)
            .field("upstream_auth_url", &self.upstream_auth_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("team", &self.team)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("upstream_connect_timeout", &self.upstream_connect_timeout)
            .field(
                "upstream_pool_max_idle_per_host",
                &self.upstream_pool_max_idle_per_host,
            )
            .field(
                "upstream_pool_idle_timeout",
                &self.upstream_pool_idle_timeout,
            )
            .field("max_request_body_size", &self.max_request_body_size)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("log_level", &self.log_level)
            .field("metrics_port", &self.metrics_port)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if any configuration is invalid
    /// (e.g., non-numeric PORT value, zero timeout, malformed upstream URL).
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = Environment::from_env();

        let config = Self {
            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: Self::parse_env("PORT", 8000)?,
            environment,

            // Upstream
            upstream_api_url: env::var("UPSTREAM_API_URL")
                .unwrap_or_else(|_| DEFAULT_UPSTREAM_API_URL.to_string()),
            upstream_auth_url: env::var("UPSTREAM_AUTH_URL")
                .unwrap_or_else(|_| DEFAULT_UPSTREAM_AUTH_URL.to_string()),
            api_token: env::var("KV_API_TOKEN")
                .ok()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            team: env::var("KV_TEAM").unwrap_or_else(|_| "MemoryStackers".to_string()),
            upstream_timeout: Duration::from_secs(Self::parse_env("UPSTREAM_TIMEOUT_SECS", 15)?),
            upstream_connect_timeout: Duration::from_secs(Self::parse_env(
                "UPSTREAM_CONNECT_TIMEOUT_SECS",
                5,
            )?),
            upstream_pool_max_idle_per_host: Self::parse_env(
                "UPSTREAM_POOL_MAX_IDLE_PER_HOST",
                16,
            )?,
            upstream_pool_idle_timeout: Duration::from_secs(Self::parse_env(
                "UPSTREAM_POOL_IDLE_TIMEOUT_SECS",
                90,
            )?),

            // Limits
            max_request_body_size: Self::parse_env("MAX_REQUEST_BODY_SIZE", 64 * 1024)?,

            // Security
            cors_allowed_origins: Self::parse_cors_origins(),

            // Observability
            log_level: env::var("RUST_LOG")
                .unwrap_or_else(|_| environment.default_log_level().to_string()),
            metrics_port: Self::parse_env("METRICS_PORT", 9090)?,
        };

        // Validate configuration before returning
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    fn validate(&self) -> AppResult<()> {
        if self.upstream_timeout.is_zero() {
            return Err(AppError::ConfigError(
                "UPSTREAM_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        if self.upstream_connect_timeout.is_zero() {
            return Err(AppError::ConfigError(
                "UPSTREAM_CONNECT_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        if self.upstream_connect_timeout > self.upstream_timeout {
            return Err(AppError::ConfigError(format!(
                "UPSTREAM_CONNECT_TIMEOUT_SECS ({:?}) must be <= UPSTREAM_TIMEOUT_SECS ({:?})",
                self.upstream_connect_timeout, self.upstream_timeout
            )));
        }

        if self.max_request_body_size == 0 {
            return Err(AppError::ConfigError(
                "MAX_REQUEST_BODY_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.team.trim().is_empty() {
            return Err(AppError::ConfigError(
                "KV_TEAM must not be empty".to_string(),
            ));
        }

        Self::validate_url("UPSTREAM_API_URL", &self.upstream_api_url)?;
        Self::validate_url("UPSTREAM_AUTH_URL", &self.upstream_auth_url)?;

        Ok(())
    }

    fn validate_url(name: &str, value: &str) -> AppResult<()> {
        let url = Url::parse(value)
            .map_err(|e| AppError::ConfigError(format!("Invalid {name} '{value}': {e}")))?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(AppError::ConfigError(format!(
                "{name} must use http or https, got '{other}'"
            ))),
        }
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if a bearer token was configured at start-up.
    pub fn has_initial_token(&self) -> bool {
        self.api_token.is_some()
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        if self.metrics_enabled() {
            Some(std::net::SocketAddr::from((
                [0, 0, 0, 0],
                self.metrics_port,
            )))
        } else {
            None
        }
    }

    /// Parse an environment variable into the specified type with a default value.
    fn parse_env<T>(name: &str, default: T) -> AppResult<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(name) {
            Ok(val) => val
                .trim()
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
            Err(_) => Ok(default),
        }
    }

    /// Parse CORS allowed origins from environment variable.
    fn parse_cors_origins() -> Vec<String> {
        env::var("CORS_ALLOWED_ORIGINS")
            .map(|raw| Self::split_origins(&raw))
            .unwrap_or_else(|_| Self::default_cors_origins())
    }

    fn split_origins(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Local frontend dev servers.
    fn default_cors_origins() -> Vec<String> {
        vec![
            "http://localhost:5173".to_string(),
            "http://127.0.0.1:5173".to_string(),
        ]
    }
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Server
            host: "0.0.0.0".to_string(),
            port: 8000,
            environment: Environment::Development,
            // Upstream
            upstream_api_url: DEFAULT_UPSTREAM_API_URL.to_string(),
            upstream_auth_url: DEFAULT_UPSTREAM_AUTH_URL.to_string(),
            api_token: None,
            team: "MemoryStackers".to_string(),
            upstream_timeout: Duration::from_secs(15),
            upstream_connect_timeout: Duration::from_secs(5),
            upstream_pool_max_idle_per_host: 16,
            upstream_pool_idle_timeout: Duration::from_secs(90),
            // Limits
            max_request_body_size: 64 * 1024,
            // Security
            cors_allowed_origins: Self::default_cors_origins(),
            // Observability
            log_level: "info".to_string(),
            metrics_port: 9090,
        }
    }
}
