//! Graceful shutdown: OS signals plus an in-process trigger

use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Cloneable handle that can request shutdown from anywhere
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Request shutdown. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Resolves on SIGTERM, SIGINT or an explicit trigger
pub struct ShutdownSignal {
    handle: ShutdownHandle,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            handle: ShutdownHandle { tx: Arc::new(tx) },
        }
    }

    pub fn handle(&self) -> ShutdownHandle {
        self.handle.clone()
    }

    /// Wait for a shutdown signal
    pub async fn wait(&self) {
        let mut triggered = self.handle.tx.subscribe();
        let manual = async move {
            // Only errors if the sender is dropped, which `self` prevents.
            let _ = triggered.wait_for(|t| *t).await;
        };

        let (mut sigterm, mut sigint) = match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(term), Ok(int)) => (term, int),
            (term, int) => {
                warn!(
                    sigterm_ok = term.is_ok(),
                    sigint_ok = int.is_ok(),
                    "failed to register signal handlers, only in-process shutdown available"
                );
                manual.await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                debug!("received SIGTERM");
            }
            _ = sigint.recv() => {
                debug!("received SIGINT");
            }
            _ = manual => {
                debug!("shutdown triggered in-process");
            }
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
