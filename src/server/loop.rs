// Server loop module
// Accepts connections until shutdown, then drains the ones still open

use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::listener::create_reusable_listener;
use super::signal::{self, ShutdownListener, ShutdownSignal};
use crate::config::{AppState, Config};
use crate::logger;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Bind the configured address and serve until SIGINT or SIGTERM
pub async fn run(config: Config) -> Result<(), Box<dyn Error>> {
    let state = Arc::new(AppState::new(&config)?);
    let addr = config.get_socket_addr()?;
    let listener = create_reusable_listener(addr)?;

    logger::log_server_start(&listener.local_addr()?, state.resolver.root(), &config);

    let shutdown = Arc::new(ShutdownSignal::new());
    signal::start_signal_handler(Arc::clone(&shutdown));

    serve(listener, state, shutdown.subscribe()).await;
    Ok(())
}

/// Accept loop over an already bound listener
///
/// Returns once `shutdown` fires and the open connections have finished or
/// the configured shutdown timeout has passed.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    mut shutdown: ShutdownListener,
) {
    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(
                            stream,
                            peer_addr,
                            &state,
                            &active_connections,
                            shutdown.clone(),
                        );
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            () = shutdown.wait() => break,
        }
    }

    drop(listener);
    logger::log_shutdown_started(active_connections.load(Ordering::SeqCst));

    let timeout = Duration::from_secs(state.config.performance.shutdown_timeout);
    let remaining = drain_connections(&active_connections, timeout).await;
    logger::log_shutdown_complete(remaining);
}

/// Wait for the active connection count to reach zero, up to `timeout`
///
/// Returns the number of connections still open when it gave up.
async fn drain_connections(active: &AtomicUsize, timeout: Duration) -> usize {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let count = active.load(Ordering::SeqCst);
        if count == 0 || tokio::time::Instant::now() >= deadline {
            return count;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drain_returns_immediately_when_idle() {
        let active = AtomicUsize::new(0);
        assert_eq!(drain_connections(&active, Duration::from_secs(5)).await, 0);
    }

    #[tokio::test]
    async fn test_drain_gives_up_after_timeout() {
        let active = AtomicUsize::new(2);
        let remaining = drain_connections(&active, Duration::from_millis(120)).await;
        assert_eq!(remaining, 2);
    }
}
