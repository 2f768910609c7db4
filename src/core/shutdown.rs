//! # OS termination signals.
//!
//! Unix listens for `SIGINT`, `SIGTERM`, `SIGQUIT` and Ctrl-C; other platforms for Ctrl-C only.

use crate::error::RuntimeError;

/// Completes when the process receives a termination signal.
///
/// Fails with [`RuntimeError::Signal`] if a handler cannot be installed.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> Result<(), RuntimeError> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt()).map_err(RuntimeError::Signal)?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(RuntimeError::Signal)?;
    let mut sigquit = signal(SignalKind::quit()).map_err(RuntimeError::Signal)?;

    tokio::select! {
        res = tokio::signal::ctrl_c() => res.map_err(RuntimeError::Signal),
        _ = sigint.recv()  => Ok(()),
        _ = sigterm.recv() => Ok(()),
        _ = sigquit.recv() => Ok(()),
    }
}

/// Completes when the process receives Ctrl-C.
#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> Result<(), RuntimeError> {
    tokio::signal::ctrl_c().await.map_err(RuntimeError::Signal)
}
