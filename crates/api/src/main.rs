//! Classroom Attendance Server - Main Entry Point

use anyhow::{anyhow, Context};
use api::{init_logging, run_server, AppState};
use metrics_exporter_prometheus::PrometheusBuilder;
use session::Settings;
use std::path::PathBuf;
use std::sync::Arc;
use storage::Repository;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional settings file as the only argument; defaults to ./attendance.toml
    let settings_path = std::env::args().nth(1).map(PathBuf::from);
    let settings = Settings::load(settings_path.as_deref()).context("Failed to load settings")?;

    init_logging(&settings.logging).map_err(|e| anyhow!(e))?;
    info!("=== Classroom Attendance v{} ===", env!("CARGO_PKG_VERSION"));

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    let state = AppState::new(&settings, Arc::new(Repository::new())).with_metrics(metrics);
    run_server(&settings.server, Arc::new(state), shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
