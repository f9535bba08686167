use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Opens a new connection handle
#[async_trait::async_trait]
pub trait Connector<T>: Send + Sync {
    async fn connect(&self) -> anyhow::Result<T>;
}

/// Why a connection attempt failed
///
/// Cloneable so one failed attempt can be handed to every caller that joined it.
#[derive(Debug, Clone, Error)]
pub enum ConnectError {
    #[error("database connection timed out after {0:?}")]
    Timeout(Duration),

    #[error("database connection failed: {0}")]
    Failed(String),
}

type Attempt<T> = Shared<BoxFuture<'static, Result<T, ConnectError>>>;

enum Slot<T> {
    Empty,
    Pending { id: u64, attempt: Attempt<T> },
    Ready(T),
}

/// Lazily opened, process-wide connection handle
///
/// The first `acquire` starts a connection attempt; callers arriving while it
/// is in flight await that same attempt. A successful handle is kept for the
/// lifetime of the cache. A failed attempt is reported to everyone who joined
/// it and then forgotten, so the next `acquire` starts over.
pub struct ConnectionCache<T: Clone + Send + Sync + 'static> {
    connector: Arc<dyn Connector<T>>,

    /// Upper bound for a single attempt
    connect_timeout: Duration,

    /// Never held across an await
    slot: Mutex<Slot<T>>,

    /// Number of attempts started so far
    attempts: AtomicU64,
}

impl<T> ConnectionCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(connector: impl Connector<T> + 'static, connect_timeout: Duration) -> Self {
        Self {
            connector: Arc::new(connector),
            connect_timeout,
            slot: Mutex::new(Slot::Empty),
            attempts: AtomicU64::new(0),
        }
    }

    /// Return the shared handle, connecting first if needed
    pub async fn acquire(&self) -> Result<T, ConnectError> {
        let (id, attempt) = {
            let mut slot = self.lock();
            match &*slot {
                Slot::Ready(handle) => return Ok(handle.clone()),
                Slot::Pending { id, attempt } => (*id, attempt.clone()),
                Slot::Empty => {
                    let id = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    let attempt = self.start_attempt(id);
                    *slot = Slot::Pending {
                        id,
                        attempt: attempt.clone(),
                    };
                    (id, attempt)
                }
            }
        };

        let result = attempt.await;

        // Whoever finishes first settles the slot; later joiners of the same
        // attempt find it already settled (or replaced by a newer attempt).
        let mut slot = self.lock();
        if matches!(&*slot, Slot::Pending { id: current, .. } if *current == id) {
            *slot = match &result {
                Ok(handle) => Slot::Ready(handle.clone()),
                Err(_) => Slot::Empty,
            };
        }

        result
    }

    /// The cached handle, without connecting
    pub fn cached(&self) -> Option<T> {
        match &*self.lock() {
            Slot::Ready(handle) => Some(handle.clone()),
            _ => None,
        }
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    fn start_attempt(&self, id: u64) -> Attempt<T> {
        let connector = Arc::clone(&self.connector);
        let timeout = self.connect_timeout;

        info!("Opening database connection (attempt {})", id);

        async move {
            match tokio::time::timeout(timeout, connector.connect()).await {
                Ok(Ok(handle)) => {
                    info!("Database connection established");
                    Ok(handle)
                }
                Ok(Err(e)) => {
                    warn!("Database connection attempt {} failed: {:#}", id, e);
                    Err(ConnectError::Failed(format!("{:#}", e)))
                }
                Err(_) => {
                    warn!("Database connection attempt {} timed out after {:?}", id, timeout);
                    Err(ConnectError::Timeout(timeout))
                }
            }
        }
        .boxed()
        .shared()
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
