//! Waiting for the signal that ends the daemon.

use std::fmt;
use std::future::Future;
use std::io;

/// Which signal asked the daemon to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGINT, usually Ctrl-C on a terminal.
    Interrupt,
    /// SIGTERM, as sent by service managers.
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => write!(f, "SIGINT"),
            ShutdownSignal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Installs the shutdown handlers and returns a future resolving on the
/// first SIGINT or SIGTERM.
///
/// Handlers are registered before this returns, so a signal arriving before
/// the future is polled is not lost.
#[cfg(unix)]
pub fn shutdown_signal() -> io::Result<impl Future<Output = io::Result<ShutdownSignal>>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => Ok(ShutdownSignal::Interrupt),
            _ = terminate.recv() => Ok(ShutdownSignal::Terminate),
        }
    })
}

#[cfg(not(unix))]
pub fn shutdown_signal() -> io::Result<impl Future<Output = io::Result<ShutdownSignal>>> {
    Ok(async {
        tokio::signal::ctrl_c().await?;
        Ok(ShutdownSignal::Interrupt)
    })
}
