use tokio::signal;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Environment;

/// Install the global tracing subscriber.
///
/// `log_level` is an `EnvFilter` directive (`Config::log_level`, i.e.
/// `RUST_LOG` or the environment's default). An unparseable directive falls
/// back to the default level and is reported once the subscriber is up.
/// Production emits JSON lines, development human-readable output.
pub fn init_tracing(environment: Environment, log_level: &str) {
    let (filter, invalid) = log_filter(environment, log_level);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    if environment.is_production() {
        builder.json().init();
    } else {
        builder.init();
    }

    if let Some(e) = invalid {
        warn!(directive = %log_level, error = %e, "Invalid log level, using default");
    }
}

fn log_filter(environment: Environment, log_level: &str) -> (EnvFilter, Option<String>) {
    match EnvFilter::try_new(log_level) {
        Ok(filter) => (filter, None),
        Err(e) => (
            EnvFilter::new(environment.default_log_level()),
            Some(e.to_string()),
        ),
    }
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
///
/// If a handler cannot be installed the error is logged and that signal is
/// never observed; the other one still triggers shutdown.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
