//! Polling state coordinator
//!
//! One coordinator instance serves one charger. It owns the snapshot, runs
//! the periodic refresh loop, deduplicates concurrent refresh requests into
//! a single outbound read, and turns credential rejections into a
//! host-visible re-authentication signal.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, instrument, warn};

use ixc_client::{ApiError, DeviceClient};
use ixc_core::{SerialNumber, Snapshot};

/// Default polling interval
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Outcome of one refresh. Errors are shared because every caller that
/// attached to an in-flight refresh observes the same failure.
pub type RefreshOutcome = Result<Snapshot, Arc<ApiError>>;

/// Cheap-to-clone handle to one charger's coordinator.
///
/// The periodic loop holds only a weak reference, so dropping every handle
/// winds the loop down; [`Coordinator::shutdown`] stops it eagerly.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

struct Inner {
    client: DeviceClient,
    serial: SerialNumber,
    interval: Duration,
    shared: RwLock<SharedState>,
    /// Single-flight guard: the task holding this lock performs the one
    /// outbound read; everyone else waits and adopts the stored outcome.
    flight: tokio::sync::Mutex<FlightSlot>,
    /// Bumped after every completed refresh. A waiter that saw a different
    /// value on entry knows a refresh finished while it waited.
    generation: AtomicU64,
    auth_tx: watch::Sender<u64>,
    loop_task: parking_lot::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

#[derive(Default)]
struct SharedState {
    snapshot: Option<Snapshot>,
    last_error: Option<Arc<ApiError>>,
}

#[derive(Default)]
struct FlightSlot {
    last: Option<RefreshOutcome>,
}

impl Coordinator {
    /// Create a coordinator with the default polling interval.
    pub fn new(client: DeviceClient, serial: SerialNumber) -> Self {
        Self::with_interval(client, serial, DEFAULT_REFRESH_INTERVAL)
    }

    /// Create a coordinator with a custom polling interval.
    pub fn with_interval(client: DeviceClient, serial: SerialNumber, interval: Duration) -> Self {
        let (auth_tx, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                client,
                serial,
                interval,
                shared: RwLock::new(SharedState::default()),
                flight: tokio::sync::Mutex::new(FlightSlot::default()),
                generation: AtomicU64::new(0),
                auth_tx,
                loop_task: parking_lot::Mutex::new(None),
            }),
        }
    }

    pub fn serial(&self) -> &SerialNumber {
        &self.inner.serial
    }

    pub fn client(&self) -> &DeviceClient {
        &self.inner.client
    }

    pub fn refresh_interval(&self) -> Duration {
        self.inner.interval
    }

    /// Perform the blocking initial refresh and start the periodic loop.
    ///
    /// The first refresh must succeed: an integration with no initial data
    /// is not usable and must not enter a half-initialized state. On
    /// failure the error propagates (after firing the re-auth signal if it
    /// was a credential rejection) and no loop is started.
    pub async fn start(&self) -> Result<(), Arc<ApiError>> {
        self.request_refresh().await?;

        let mut guard = self.inner.loop_task.lock();
        if guard.is_none() {
            let weak = Arc::downgrade(&self.inner);
            let interval = self.inner.interval;
            *guard = Some(tokio::spawn(run_periodic(weak, interval)));
        }
        Ok(())
    }

    /// Stop the periodic loop. Reads of the last snapshot remain valid.
    pub fn shutdown(&self) {
        if let Some(handle) = self.inner.loop_task.lock().take() {
            handle.abort();
        }
    }

    /// Refresh now, or attach to the refresh already in flight.
    ///
    /// At most one outbound read is ever in flight per coordinator; every
    /// caller that arrives during that window observes the identical
    /// outcome. A successful refresh replaces the snapshot wholesale and
    /// clears the recorded error.
    pub async fn request_refresh(&self) -> RefreshOutcome {
        let entered = self.inner.generation.load(Ordering::Acquire);
        let mut slot = self.inner.flight.lock().await;
        if self.inner.generation.load(Ordering::Acquire) != entered {
            // a refresh completed while we waited for the guard; its
            // outcome is ours
            if let Some(outcome) = slot.last.clone() {
                return outcome;
            }
        }

        let outcome = self.fetch_and_store().await;
        slot.last = Some(outcome.clone());
        self.inner.generation.fetch_add(1, Ordering::Release);
        outcome
    }

    /// The latest snapshot, if any refresh has ever succeeded. Non-blocking.
    pub fn current_snapshot(&self) -> Option<Snapshot> {
        self.inner.shared.read().snapshot.clone()
    }

    /// The most recent refresh failure, cleared by the next success.
    pub fn current_error(&self) -> Option<Arc<ApiError>> {
        self.inner.shared.read().last_error.clone()
    }

    /// A device is available to readers exactly when a snapshot exists.
    /// A stale-but-present snapshot still serves its last known values.
    pub fn is_available(&self) -> bool {
        self.inner.shared.read().snapshot.is_some()
    }

    /// Merge one key/value pair into the snapshot without contacting the
    /// server. No-op before the first successful refresh: fabricating a
    /// one-key snapshot would present false availability to unrelated
    /// readers.
    pub fn apply_optimistic_patch(&self, key: &str, value: serde_json::Value) {
        let mut shared = self.inner.shared.write();
        match &shared.snapshot {
            Some(snapshot) => {
                debug!("optimistically patching {key} for charger {}", self.inner.serial);
                shared.snapshot = Some(snapshot.with_patched(key, value));
            }
            None => {
                debug!("no snapshot yet; skipping optimistic patch for {key}");
            }
        }
    }

    /// Host-visible re-authentication signal: a counter that increments on
    /// every credential rejection, during initial start or any later
    /// refresh.
    pub fn subscribe_auth_failures(&self) -> watch::Receiver<u64> {
        self.inner.auth_tx.subscribe()
    }

    #[instrument(skip(self), fields(serial = %self.inner.serial))]
    async fn fetch_and_store(&self) -> RefreshOutcome {
        debug!("refreshing properties");
        match self.inner.client.get_all_properties(&self.inner.serial).await {
            Ok(properties) => {
                let snapshot = Snapshot::new(properties);
                let mut shared = self.inner.shared.write();
                shared.snapshot = Some(snapshot.clone());
                shared.last_error = None;
                debug!("refresh complete with {} properties", snapshot.len());
                Ok(snapshot)
            }
            Err(err) => {
                if matches!(err, ApiError::Authentication) {
                    warn!("API key rejected; signalling re-authentication");
                    self.inner.auth_tx.send_modify(|count| *count += 1);
                } else {
                    warn!("refresh failed: {err}");
                }
                let err = Arc::new(err);
                self.inner.shared.write().last_error = Some(err.clone());
                Err(err)
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self.loop_task.lock().take() {
            handle.abort();
        }
    }
}

/// Periodic refresh loop. A failed tick records the error and keeps going;
/// the poll interval is the retry throttle. Exits once every coordinator
/// handle has been dropped.
async fn run_periodic(inner: Weak<Inner>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick fires immediately; the initial refresh already ran
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let Some(strong) = inner.upgrade() else {
            return;
        };
        let coordinator = Coordinator { inner: strong };
        let _ = coordinator.request_refresh().await;
    }
}
