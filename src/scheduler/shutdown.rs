//! Waiting for termination signals.

use std::io;

use tokio::signal;

/// Resolves once SIGINT or SIGTERM is received and returns the signal name.
#[cfg(unix)]
pub async fn wait_for_signal() -> io::Result<&'static str> {
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    tokio::select! {
        res = signal::ctrl_c() => res.map(|()| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

/// Resolves once Ctrl+C is received.
#[cfg(not(unix))]
pub async fn wait_for_signal() -> io::Result<&'static str> {
    signal::ctrl_c().await.map(|()| "Ctrl+C")
}
