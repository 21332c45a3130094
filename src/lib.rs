//! # KV Gateway
//!
//! A small HTTP gateway in front of the KV sensor/actuator REST API, used by
//! browser dashboards that cannot call the upstream directly:
//!
//! - **Single upstream pool**: One shared `reqwest` client with bounded timeouts
//! - **Token handling**: Bearer token seeded from env or fetched on demand,
//!   swapped atomically
//! - **Input validation**: Sample queries and resource IDs checked before any
//!   upstream call
//! - **Observability**: Request IDs, structured logging, Prometheus metrics
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Middleware (Request ID → Trace → CORS → Client Deadline)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Handlers (health, sensors, actuators, token)               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Validation (sample query normalization, resource IDs)      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  UpstreamClient + TokenStore                                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  KV upstream REST API (HTTPS)                               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kv_gateway::{AppState, Config, build_router};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let addr = config.server_addr();
//!
//!     let state = AppState::new(config)?;
//!     let app = build_router(state);
//!
//!     let listener = tokio::net::TcpListener::bind(addr).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Token Configuration
//!
//! Start with a token already in hand:
//! ```bash
//! KV_API_TOKEN=eyJhbGciOi... cargo run
//! ```
//!
//! Or start without one and fetch it through the gateway:
//! ```bash
//! curl http://localhost:8000/api/token
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod upstream;
pub mod utils;
pub mod validation;

// Re-exports for convenience
pub use config::{Config, Environment};
pub use error::{AppError, AppResult};
pub use routes::build_router;
pub use state::AppState;
pub use upstream::{Credentials, TokenStore, UpstreamClient};
