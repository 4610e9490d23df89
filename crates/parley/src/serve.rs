// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parley serve` command implementation.
//!
//! Opens storage, assembles the chat service, and serves the HTTP gateway
//! until SIGINT/SIGTERM. Expired rate-limit and ban entries are purged in
//! the background.

use std::sync::Arc;
use std::time::Duration;

use parley_config::ParleyConfig;
use parley_core::{Clock, ParleyError, StorageAdapter};
use parley_gateway::AppState;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app::build_app;
use crate::shutdown;

/// How often expired key-value rows are removed.
pub const KV_PURGE_INTERVAL: Duration = Duration::from_secs(600);

/// Runs the `parley serve` command.
pub async fn run_serve(config: ParleyConfig) -> Result<(), ParleyError> {
    info!("starting parley serve");

    let app = build_app(&config).await?;
    let cancel = shutdown::install_signal_handler();

    let purge = spawn_kv_purge(
        app.storage.clone(),
        app.clock.clone(),
        KV_PURGE_INTERVAL,
        cancel.clone(),
    );

    let state = AppState::new(app.chat.clone(), config.widget.clone())
        .with_trusted_proxies(config.server.trusted_proxies.iter().copied());
    let server_cancel = cancel.clone();
    let served = parley_gateway::serve(&config.server, state, async move {
        server_cancel.cancelled().await;
    })
    .await;

    // The server may also stop on a bind error; make sure the purge task ends.
    cancel.cancel();
    if let Err(e) = purge.await {
        warn!(error = %e, "purge task ended abnormally");
    }

    if let Err(e) = app.storage.close().await {
        warn!(error = %e, "storage close failed");
    }

    served?;
    info!("parley serve shutdown complete");
    Ok(())
}

/// Background task removing expired key-value rows every `interval`.
pub fn spawn_kv_purge(
    storage: Arc<dyn StorageAdapter>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // Skip the first immediate tick.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match storage.kv_purge_expired(clock.now_secs()).await {
                        Ok(0) => debug!("no expired kv entries"),
                        Ok(removed) => info!(removed, "purged expired kv entries"),
                        Err(e) => warn!(error = %e, "kv purge failed (non-fatal)"),
                    }
                }
                _ = cancel.cancelled() => {
                    debug!("kv purge task shutting down");
                    break;
                }
            }
        }
    })
}

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parley={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
