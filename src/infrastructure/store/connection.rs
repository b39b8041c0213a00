//! Shared store connection with single-flight connect

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::{debug, info, warn};

use crate::domain::{DomainError, KeyValueStore};

/// Opens physical connections to a backing store
#[async_trait]
pub trait StoreConnector: Send + Sync + fmt::Debug {
    /// Performs one connection attempt
    async fn connect(&self) -> Result<Arc<dyn KeyValueStore>, DomainError>;

    /// Human-readable target for logs (must not contain credentials)
    fn target(&self) -> String;
}

type PendingConnection = Shared<BoxFuture<'static, Result<Arc<dyn KeyValueStore>, DomainError>>>;

enum ConnectionState {
    Disconnected,
    /// An attempt is in flight; every caller awaits the same result.
    /// `closing` marks an attempt released by `disconnect` whose result
    /// is discarded once it settles.
    Connecting {
        attempt: u64,
        pending: PendingConnection,
        closing: bool,
    },
    Connected(Arc<dyn KeyValueStore>),
}

impl ConnectionState {
    fn name(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting { .. } => "connecting",
            Self::Connected(_) => "connected",
        }
    }
}

/// Owns the single shared connection to the key-value store
///
/// `ensure_connected` funnels every caller through one acquisition path:
/// the first caller installs a pending attempt before awaiting it, and
/// concurrent callers join that attempt instead of starting their own.
pub struct ConnectionManager {
    connector: Arc<dyn StoreConnector>,
    state: Mutex<ConnectionState>,
    connect_timeout: Duration,
    attempts: AtomicU64,
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connector", &self.connector)
            .field("state", &self.lock_state().name())
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn StoreConnector>) -> Self {
        Self::with_timeout(connector, Duration::from_secs(5))
    }

    pub fn with_timeout(connector: Arc<dyn StoreConnector>, connect_timeout: Duration) -> Self {
        Self {
            connector,
            state: Mutex::new(ConnectionState::Disconnected),
            connect_timeout,
            attempts: AtomicU64::new(0),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ConnectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the shared connection, connecting first if needed
    ///
    /// A caller arriving while a released attempt is still in flight waits
    /// for it to finish and then connects afresh, so physical attempts
    /// never overlap.
    pub async fn ensure_connected(&self) -> Result<Arc<dyn KeyValueStore>, DomainError> {
        loop {
            let (attempt, pending, released) = {
                let mut state = self.lock_state();

                match &*state {
                    ConnectionState::Connected(store) => return Ok(store.clone()),
                    ConnectionState::Connecting {
                        attempt,
                        pending,
                        closing,
                    } => {
                        debug!(attempt, closing, "Joining in-flight store connection attempt");
                        (*attempt, pending.clone(), *closing)
                    }
                    ConnectionState::Disconnected => {
                        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
                        let pending = self.start_attempt(attempt);

                        *state = ConnectionState::Connecting {
                            attempt,
                            pending: pending.clone(),
                            closing: false,
                        };
                        (attempt, pending, false)
                    }
                }
            };

            let result = pending.await;
            self.settle(attempt, &result);

            if !released {
                return result;
            }
        }
    }

    fn start_attempt(&self, attempt: u64) -> PendingConnection {
        let connector = self.connector.clone();
        let connect_timeout = self.connect_timeout;

        async move {
            info!(store = %connector.target(), attempt, "Connecting to store");

            match tokio::time::timeout(connect_timeout, connector.connect()).await {
                Ok(result) => result,
                Err(_) => Err(DomainError::connection(format!(
                    "Timed out connecting to {} after {:?}",
                    connector.target(),
                    connect_timeout
                ))),
            }
        }
        .boxed()
        .shared()
    }

    /// Records the outcome of `attempt` unless the state moved on meanwhile
    fn settle(&self, attempt: u64, result: &Result<Arc<dyn KeyValueStore>, DomainError>) {
        let mut state = self.lock_state();

        let (current, closing) = match &*state {
            ConnectionState::Connecting {
                attempt: current,
                closing,
                ..
            } => (*current, *closing),
            _ => return,
        };

        if current != attempt {
            return;
        }

        if closing {
            debug!(store = %self.connector.target(), attempt, "Discarding released connection attempt");
            *state = ConnectionState::Disconnected;
            return;
        }

        match result {
            Ok(store) => {
                info!(store = %self.connector.target(), "Store connection established");
                *state = ConnectionState::Connected(store.clone());
            }
            Err(e) => {
                warn!(store = %self.connector.target(), error = %e, "Store connection failed");
                *state = ConnectionState::Disconnected;
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(&*self.lock_state(), ConnectionState::Connected(_))
    }

    /// Number of physical connection attempts started so far
    pub fn connect_attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Drops the shared connection; a no-op when not connected
    ///
    /// An in-flight attempt is released rather than abandoned: it runs to
    /// completion and its result is discarded. Returns whether a connection
    /// or pending attempt was released.
    pub fn disconnect(&self) -> bool {
        let mut state = self.lock_state();

        if let ConnectionState::Connecting { closing, .. } = &mut *state {
            if *closing {
                return false;
            }

            *closing = true;
            info!(store = %self.connector.target(), "Pending store connection released");
            return true;
        }

        match std::mem::replace(&mut *state, ConnectionState::Disconnected) {
            ConnectionState::Disconnected => false,
            previous => {
                info!(
                    store = %self.connector.target(),
                    previous = previous.name(),
                    "Store connection closed"
                );
                true
            }
        }
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::infrastructure::store::InMemoryStore;
    use std::sync::atomic::AtomicUsize;

    /// Connector counting attempts, optionally slow or failing
    #[derive(Debug)]
    pub struct MockConnector {
        store: Arc<dyn KeyValueStore>,
        delay: Duration,
        failures_left: AtomicUsize,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
    }

    impl MockConnector {
        pub fn new() -> Self {
            Self {
                store: Arc::new(InMemoryStore::new()),
                delay: Duration::ZERO,
                failures_left: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                peak_in_flight: AtomicUsize::new(0),
            }
        }

        /// Hands out `store` on every successful attempt
        pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
            self.store = store;
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn failing(self, times: usize) -> Self {
            self.failures_left.store(times, Ordering::SeqCst);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Most attempts ever running at the same time
        pub fn peak_in_flight(&self) -> usize {
            self.peak_in_flight.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StoreConnector for MockConnector {
        async fn connect(&self) -> Result<Arc<dyn KeyValueStore>, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(running, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let failed = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();

            if failed {
                return Err(DomainError::connection("connection refused"));
            }

            Ok(self.store.clone())
        }

        fn target(&self) -> String {
            "mock://store".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockConnector;
    use super::*;

    #[tokio::test]
    async fn test_connects_once_and_reuses() {
        let connector = Arc::new(MockConnector::new());
        let manager = ConnectionManager::new(connector.clone());

        assert!(!manager.is_connected());

        let first = manager.ensure_connected().await.unwrap();
        let second = manager.ensure_connected().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(manager.is_connected());
        assert_eq!(connector.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_attempt() {
        let connector = Arc::new(MockConnector::new().with_delay(Duration::from_millis(50)));
        let manager = Arc::new(ConnectionManager::new(connector.clone()));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.ensure_connected().await })
            })
            .collect();

        for task in futures::future::join_all(tasks).await {
            assert!(task.unwrap().is_ok());
        }

        assert_eq!(connector.calls(), 1);
        assert_eq!(manager.connect_attempts(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_failure() {
        let connector = Arc::new(
            MockConnector::new()
                .with_delay(Duration::from_millis(50))
                .failing(1),
        );
        let manager = Arc::new(ConnectionManager::new(connector.clone()));

        let (a, b) = tokio::join!(manager.ensure_connected(), manager.ensure_connected());

        assert!(a.unwrap_err().is_connection());
        assert!(b.unwrap_err().is_connection());
        assert_eq!(connector.calls(), 1);
        assert!(!manager.is_connected());
    }

    #[tokio::test]
    async fn test_retry_after_failure() {
        let connector = Arc::new(MockConnector::new().failing(1));
        let manager = ConnectionManager::new(connector.clone());

        assert!(manager.ensure_connected().await.is_err());
        assert!(manager.ensure_connected().await.is_ok());
        assert_eq!(connector.calls(), 2);
    }

    #[tokio::test]
    async fn test_connect_timeout_fails_instead_of_hanging() {
        let connector = Arc::new(MockConnector::new().with_delay(Duration::from_secs(10)));
        let manager = ConnectionManager::with_timeout(connector, Duration::from_millis(20));

        let err = manager.ensure_connected().await.unwrap_err();

        assert!(err.is_connection());
        assert!(err.to_string().contains("Timed out"));
        assert!(!manager.is_connected());
    }

    #[tokio::test]
    async fn test_disconnect_during_attempt_never_overlaps_connects() {
        let connector = Arc::new(MockConnector::new().with_delay(Duration::from_millis(50)));
        let manager = Arc::new(ConnectionManager::new(connector.clone()));

        let first = tokio::spawn({
            let manager = manager.clone();
            async move { manager.ensure_connected().await }
        });

        while manager.connect_attempts() == 0 {
            tokio::task::yield_now().await;
        }

        assert!(manager.disconnect());
        assert!(!manager.disconnect());

        let second = manager.ensure_connected().await;

        assert!(first.await.unwrap().is_ok());
        assert!(second.is_ok());
        assert!(manager.is_connected());
        assert_eq!(connector.calls(), 2);
        assert_eq!(connector.peak_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let connector = Arc::new(MockConnector::new());
        let manager = ConnectionManager::new(connector.clone());

        assert!(!manager.disconnect());

        manager.ensure_connected().await.unwrap();
        assert!(manager.disconnect());
        assert!(!manager.is_connected());
        assert!(!manager.disconnect());

        manager.ensure_connected().await.unwrap();
        assert_eq!(connector.calls(), 2);
    }
}
