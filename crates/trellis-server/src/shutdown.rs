//! Graceful shutdown signal handling.
//!
//! A [`ShutdownSignal`] stops the accept loop and asks every open
//! connection to finish its in-flight request and close. A
//! [`ConnectionTracker`] lets the listener wait for those connections.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Notify};

/// A signal that can be used to trigger and await graceful shutdown.
///
/// Clones share the same state.
///
/// # Example
///
/// ```rust
/// use trellis_server::ShutdownSignal;
///
/// let shutdown = ShutdownSignal::new();
/// let handle = shutdown.clone();
///
/// handle.trigger();
/// assert!(shutdown.is_shutdown());
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    state: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Creates a new, untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    /// Triggers the signal. Calling it more than once has no further effect.
    pub fn trigger(&self) {
        if !self.state.send_replace(true) {
            tracing::debug!("shutdown triggered");
        }
    }

    /// Returns `true` once the signal has been triggered.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.state.borrow()
    }

    /// Completes when the signal is triggered, immediately if it already
    /// was.
    pub async fn recv(&self) {
        let mut receiver = self.state.subscribe();
        // The sender lives as long as `self`, so waiting cannot fail.
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }

    /// Creates a signal triggered by SIGINT or SIGTERM (Ctrl+C elsewhere).
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let handle = signal.clone();

        tokio::spawn(async move {
            wait_for_os_signal().await;
            handle.trigger();
        });

        signal
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn wait_for_os_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!(error = %e, "failed to register signal handlers");
                return std::future::pending().await;
            }
        };

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => tracing::info!("received SIGINT, shutting down"),
    }
}

#[cfg(not(unix))]
async fn wait_for_os_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        return std::future::pending().await;
    }
    tracing::info!("received Ctrl+C, shutting down");
}

/// Counts open connections so shutdown can wait for them.
///
/// # Example
///
/// ```rust
/// use trellis_server::ConnectionTracker;
///
/// let tracker = ConnectionTracker::new();
/// let token = tracker.acquire();
/// assert_eq!(tracker.active_connections(), 1);
///
/// drop(token);
/// assert_eq!(tracker.active_connections(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl ConnectionTracker {
    /// Creates a tracker with no connections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection; dropping the token unregisters it.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.active.fetch_add(1, Ordering::SeqCst);
        ConnectionToken {
            active: Arc::clone(&self.active),
            notify: Arc::clone(&self.notify),
        }
    }

    /// Returns the number of open connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Completes once every token has been dropped.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.notify.notified();
            if self.active.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// A live connection registered with a [`ConnectionTracker`].
#[derive(Debug)]
pub struct ConnectionToken {
    active: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        if self.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.notify.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_shutdown_signal_trigger_idempotent() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_shutdown());
        signal.trigger();
        signal.trigger();
        assert!(signal.is_shutdown());
    }

    #[test]
    fn test_shutdown_signal_clone_shares_state() {
        let signal = ShutdownSignal::new();
        let handle = signal.clone();
        handle.trigger();
        assert!(signal.is_shutdown());
    }

    #[tokio::test]
    async fn test_recv_completes_when_triggered() {
        let signal = ShutdownSignal::new();
        let handle = signal.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            handle.trigger();
        });

        tokio::time::timeout(Duration::from_secs(1), signal.recv())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_recv_completes_immediately_if_triggered() {
        let signal = ShutdownSignal::new();
        signal.trigger();

        tokio::time::timeout(Duration::from_millis(50), signal.recv())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_recv_pending_until_triggered() {
        let signal = ShutdownSignal::new();
        let result = tokio::time::timeout(Duration::from_millis(20), signal.recv()).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_connection_tracker_counts() {
        let tracker = ConnectionTracker::new();
        let first = tracker.acquire();
        let second = tracker.acquire();
        assert_eq!(tracker.active_connections(), 2);

        drop(first);
        assert_eq!(tracker.active_connections(), 1);
        drop(second);
        assert_eq!(tracker.active_connections(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle_without_connections() {
        let tracker = ConnectionTracker::new();
        tokio::time::timeout(Duration::from_millis(50), tracker.wait_idle())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_idle_after_last_token_dropped() {
        let tracker = ConnectionTracker::new();
        let token = tracker.acquire();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            drop(token);
        });

        tokio::time::timeout(Duration::from_secs(1), tracker.wait_idle())
            .await
            .unwrap();
    }
}
