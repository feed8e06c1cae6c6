// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)

use crate::logger;
use std::sync::Arc;
use tokio::sync::watch;

/// Broadcasts the shutdown request to the accept loop and every connection
pub struct ShutdownSignal {
    sender: watch::Sender<bool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of [`ShutdownSignal`]
#[derive(Clone)]
pub struct ShutdownListener {
    receiver: watch::Receiver<bool>,
}

impl ShutdownListener {
    /// Resolve once shutdown has been requested (immediately if it already
    /// was, or if the signal itself is gone)
    pub async fn wait(&mut self) {
        let _ = self.receiver.wait_for(|requested| *requested).await;
    }

    #[cfg(test)]
    fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }
}

/// Start signal handlers
///
/// Spawns a background task that triggers `signal` on the first
/// SIGTERM or SIGINT.
#[cfg(unix)]
pub fn start_signal_handler(signal: Arc<ShutdownSignal>) {
    use tokio::signal::unix::{signal as unix_signal, SignalKind};

    tokio::spawn(async move {
        let (mut sigterm, mut sigint) = match (
            unix_signal(SignalKind::terminate()),
            unix_signal(SignalKind::interrupt()),
        ) {
            (Ok(term), Ok(int)) => (term, int),
            (Err(e), _) | (_, Err(e)) => {
                logger::log_error(&format!(
                    "Failed to register signal handlers, falling back to Ctrl+C only: {e}"
                ));
                if tokio::signal::ctrl_c().await.is_ok() {
                    signal.trigger();
                }
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => logger::log_info("SIGTERM received, shutting down"),
            _ = sigint.recv() => logger::log_info("SIGINT received, shutting down"),
        }
        signal.trigger();
    });
}

/// Non-Unix fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(signal: Arc<ShutdownSignal>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            logger::log_info("Ctrl+C received, shutting down");
            signal.trigger();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_wakes_all_listeners() {
        let signal = ShutdownSignal::new();
        let mut first = signal.subscribe();
        let mut second = first.clone();
        assert!(!first.is_triggered());

        signal.trigger();
        tokio::time::timeout(Duration::from_secs(1), first.wait())
            .await
            .unwrap();
        tokio::time::timeout(Duration::from_secs(1), second.wait())
            .await
            .unwrap();
        assert!(second.is_triggered());
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_shutdown() {
        let signal = ShutdownSignal::new();
        signal.trigger();

        let mut late = signal.subscribe();
        tokio::time::timeout(Duration::from_secs(1), late.wait())
            .await
            .unwrap();
    }
}
