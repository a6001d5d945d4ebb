use std::process::ExitCode;

use anyhow::Result;
use tracing::{debug, error, info, warn};

use clipd_core::classify::classify;
use clipd_core::config::RuntimeConfig;
use clipd_infra::HistoryStore;
use clipd_platform::{ClipboardBackend, InstanceLock, LockError};

/// Exit status of a daemon that found another instance already running.
const EXIT_ALREADY_RUNNING: u8 = 2;

/// Foreground ingestion loop: backend snapshot -> classifier -> store.
pub async fn run(config: RuntimeConfig) -> Result<ExitCode> {
    let _lock = match InstanceLock::acquire(&config.lock_file) {
        Ok(lock) => lock,
        Err(e @ LockError::AlreadyHeld { .. }) => {
            error!("{e}");
            return Ok(ExitCode::from(EXIT_ALREADY_RUNNING));
        }
        Err(e) => return Err(e.into()),
    };

    let store = HistoryStore::open(&config)?;
    let mut backend = ClipboardBackend::spawn(&config.settings)?;
    let max_image_bytes = config.settings.max_image_bytes;
    info!(mode = ?backend.kind(), "clipd daemon started");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
            snapshot = backend.recv() => {
                let Some(snapshot) = snapshot else {
                    warn!("clipboard backend stopped, exiting");
                    break;
                };
                let Some(captured) = classify(snapshot, max_image_bytes) else {
                    continue;
                };
                // Ingestion errors never stop the loop; the pool hands out a
                // fresh connection on the next snapshot.
                match store.insert(&captured) {
                    Ok(true) => debug!("clipboard entry stored"),
                    Ok(false) => {}
                    Err(e) => warn!(error = %e, "failed to store clipboard capture"),
                }
            }
        }
    }

    info!("clipd daemon stopped");
    Ok(ExitCode::SUCCESS)
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = signal(SignalKind::terminate()).expect("installing SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
