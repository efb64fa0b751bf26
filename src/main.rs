//! TIERDRAW: tiered token-holder reward draws.
//!
//! Entry point. Loads configuration, initialises logging, wires the
//! Helius index into the tracker and runs fetch→draw→persist cycles
//! until Ctrl+C or SIGTERM.

use anyhow::Result;
use secrecy::SecretString;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use tierdraw::config::AppConfig;
use tierdraw::engine::tracker::Tracker;
use tierdraw::events::TracingSink;
use tierdraw::indexer::helius::HeliusClient;
use tierdraw::logging;
use tierdraw::storage::ResultStore;

const BANNER: &str = r#"
 _____ ___ _____ ____  ____  ____      ___        __
|_   _|_ _| ____|  _ \|  _ \|  _ \    / \ \      / /
  | |  | ||  _| | |_) | | | | |_) |  / _ \ \ /\ / /
  | |  | || |___|  _ <| |_| |  _ <  / ___ \ V  V /
  |_| |___|_____|_| \_\____/|_| \_\/_/   \_\_/\_/

  Token holder tiers and reward draws
  v0.1.0
"#;

/// Config file read when `TIERDRAW_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "tracker.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path =
        std::env::var("TIERDRAW_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config_found = Path::new(&config_path).exists();
    let cfg = if config_found {
        AppConfig::load(&config_path)?
    } else {
        AppConfig::default()
    };

    logging::init_logging(&cfg.logging)?;

    println!("{BANNER}");
    if !config_found {
        warn!(path = %config_path, "Config file not found, using built-in defaults");
    }
    info!(
        name = %cfg.tracker.name,
        mint = %cfg.token.mint,
        interval_secs = cfg.tracker.interval_secs,
        tiers = cfg.tiers.len(),
        "TIERDRAW starting up"
    );

    // -- Initialise components -------------------------------------------

    let api_key = match AppConfig::resolve_env(&cfg.indexer.api_key_env) {
        Ok(key) => Some(SecretString::new(key)),
        Err(e) => {
            warn!(error = %e, "No index API key, requests will be unauthenticated");
            None
        }
    };
    let index = HeliusClient::from_config(&cfg.indexer, api_key)?;
    let store = ResultStore::new(&cfg.output)?;
    info!(
        output_dir = %store.dir().display(),
        log_dir = %cfg.logging.dir.display(),
        "Output locations"
    );

    let tracker = Tracker::new(cfg, Box::new(index), store, Arc::new(TracingSink))?;

    // -- Main loop ---------------------------------------------------------

    let cycles = tracker.run_until(shutdown_signal()).await?;

    info!(cycles, "TIERDRAW shut down cleanly");
    Ok(())
}

/// Resolves on the first Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl+C received, shutting down..."),
        _ = terminate => info!("SIGTERM received, shutting down..."),
    }
}
