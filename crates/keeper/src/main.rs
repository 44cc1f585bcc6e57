//! Oracle keeper daemon
//!
//! Usage: `oracle-keeper [deployment.toml]`

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use oracle_keeper::{DeploymentConfig, Keeper};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Starting oracle keeper v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let path = env::args()
        .nth(1)
        .or_else(|| env::var("ORACLE_DEPLOYMENT").ok())
        .map(PathBuf::from);
    let deployment = DeploymentConfig::load(path.as_deref())?;

    let keeper = Arc::new(Keeper::new(deployment)?);
    info!(assets = keeper.oracle().assets().len(), "Oracle ready");

    // Setup shutdown channel
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    // Spawn shutdown signal handler
    tokio::spawn(async move {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received Ctrl+C");
            }
            _ = terminate => {
                info!("Received termination signal");
            }
        }

        let _ = shutdown_tx.send(());
    });

    info!("Press Ctrl+C to shutdown");

    if let Err(e) = keeper.run(shutdown_rx).await {
        error!("Keeper error: {:#}", e);
        return Err(e);
    }

    info!("Keeper shutdown complete");
    Ok(())
}
