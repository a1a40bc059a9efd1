//! Signal handling for graceful shutdown

use std::io;

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};
#[cfg(windows)]
use tokio::signal::windows::{ctrl_c, ctrl_close, CtrlC, CtrlClose};
use tracing::debug;

/// Termination signal that was received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownKind {
    Terminate,
    Interrupt,
}

/// Listens for SIGTERM and SIGINT, or console close and Ctrl-C on Windows
pub struct ShutdownSignal {
    #[cfg(unix)]
    sigterm: Signal,
    #[cfg(unix)]
    sigint: Signal,
    #[cfg(windows)]
    close: CtrlClose,
    #[cfg(windows)]
    ctrl_c: CtrlC,
}

impl ShutdownSignal {
    /// Register the signal handlers. Must run inside a tokio runtime.
    #[cfg(unix)]
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            sigterm: signal(SignalKind::terminate())?,
            sigint: signal(SignalKind::interrupt())?,
        })
    }

    /// Register the console handlers. Must run inside a tokio runtime.
    #[cfg(windows)]
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            close: ctrl_close()?,
            ctrl_c: ctrl_c()?,
        })
    }

    /// Wait for the next shutdown signal
    #[cfg(unix)]
    pub async fn wait(&mut self) -> ShutdownKind {
        tokio::select! {
            _ = self.sigterm.recv() => {
                debug!("received SIGTERM");
                ShutdownKind::Terminate
            }
            _ = self.sigint.recv() => {
                debug!("received SIGINT");
                ShutdownKind::Interrupt
            }
        }
    }

    /// Wait for the next shutdown signal
    #[cfg(windows)]
    pub async fn wait(&mut self) -> ShutdownKind {
        tokio::select! {
            _ = self.close.recv() => {
                debug!("received console close");
                ShutdownKind::Terminate
            }
            _ = self.ctrl_c.recv() => {
                debug!("received Ctrl-C");
                ShutdownKind::Interrupt
            }
        }
    }
}
