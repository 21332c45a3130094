use std::net::SocketAddr;
use std::process::ExitCode;

use tokio::net::TcpListener;
use tracing::{error, info};

use kv_gateway::{AppResult, AppState, Config, Environment, build_router, metrics, utils};

#[tokio::main]
async fn main() -> ExitCode {
    // Configuration decides the log format and level, so it is read first;
    // a load error is reported once logging is up.
    let config = Config::from_env();
    match &config {
        Ok(config) => utils::init_tracing(config.environment, &config.log_level),
        Err(_) => {
            let environment = Environment::from_env();
            utils::init_tracing(environment, environment.default_log_level());
        }
    }

    info!("Starting KV Gateway v{}", env!("CARGO_PKG_VERSION"));

    match run(config).await {
        Ok(()) => ExitCode::from(exitcode::OK as u8),
        Err(exit_code) => ExitCode::from(exit_code as u8),
    }
}

/// Run the application, returning an exit code on error.
async fn run(config: AppResult<Config>) -> Result<(), exitcode::ExitCode> {
    let config = config.map_err(|e| {
        error!("Configuration error: {e}");
        exitcode::CONFIG
    })?;
    info!(
        host = %config.host,
        port = %config.port,
        environment = %config.environment,
        upstream = %config.upstream_api_url,
        team = %config.team,
        log_level = %config.log_level,
        token_seeded = config.has_initial_token(),
        "Configuration loaded"
    );

    // Metrics listener (optional)
    match config.metrics_addr() {
        Some(metrics_addr) => metrics::try_init_metrics(metrics_addr),
        None => info!("Metrics disabled (METRICS_PORT=0)"),
    }

    let addr: SocketAddr = config.server_addr().parse().map_err(|e| {
        error!("Invalid server address: {e}");
        exitcode::CONFIG
    })?;

    // Build application state and router
    let state = AppState::new(config).map_err(|e| {
        error!("Failed to initialize upstream client: {e}");
        exitcode::SOFTWARE
    })?;
    let app = build_router(state);

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to {addr}: {e}");
        exitcode::UNAVAILABLE
    })?;

    info!("Server listening on http://{addr}");
    info!("API endpoints:");
    info!("  GET  /health                          - Health check");
    info!("  GET  /ready                           - Readiness check");
    info!("  GET  /api/all/sensors                 - List sensors");
    info!("  GET  /api/sensors/sample/{{sensor_id}}  - Query sensor samples");
    info!("  GET  /api/all/actuators               - List actuators");
    info!("  GET  /api/actuator/{{actuator_id}}      - Get actuator");
    info!("  PUT  /api/actuator/{{actuator_id}}      - Set actuator state");
    info!("  GET  /api/token                       - Refresh upstream token");

    // Start server with graceful shutdown; dropping in-flight handlers
    // cancels their upstream calls.
    axum::serve(listener, app)
        .with_graceful_shutdown(utils::shutdown_signal())
        .await
        .map_err(|e| {
            error!("Server error: {e}");
            exitcode::SOFTWARE
        })?;

    info!("Server shutdown complete");
    Ok(())
}
