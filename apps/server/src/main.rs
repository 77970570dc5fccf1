//! # Mesha POS Server Entry Point
//!
//! ## Application Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mesha POS Server                                 │
//! │                                                                         │
//! │  Browser (cashier / manager)                                            │
//! │       │                                                                 │
//! │       │  JSON over HTTP                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                  mesha-server (this binary)                      │  │
//! │  │                                                                  │  │
//! │  │  main.rs ────► config, logging, shutdown signal                 │  │
//! │  │  lib.rs ─────► router, run()                                    │  │
//! │  │  handlers/ ──► inventory, cart, checkout, reports               │  │
//! │  │  services/ ──► checkout orchestrator, report service            │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                         SQLite Database                          │  │
//! │  │  mesha.db (local file, WAL mode)                                 │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Load configuration (defaults, mesha.toml, MESHA__* environment)
//! 3. Connect to database & run migrations
//! 4. Serve until Ctrl+C or SIGTERM

use mesha_server::config::ServerConfig;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    mesha_server::init_tracing();

    info!("Starting Mesha POS server...");

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Configuration rejected");
            return Err(e.into());
        }
    };
    info!(
        host = %config.host,
        port = config.port,
        database = %config.database_path,
        store = %config.store.name,
        "Configuration loaded"
    );

    mesha_server::run(config, shutdown_signal()).await
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
