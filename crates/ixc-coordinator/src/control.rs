//! Optimistic control operation
//!
//! Every user-facing write follows the same protocol: send the write, patch
//! the snapshot optimistically, wait out the device's apply latency, then
//! request a confirming refresh whose result fully replaces the patch.

use std::time::Duration;

use tracing::{debug, instrument, warn};

use ixc_client::Result;
use ixc_core::PropertyMap;

use crate::coordinator::Coordinator;

/// How long the device typically needs before a read reflects a write.
/// Confirming earlier risks reading the pre-write value and reverting the
/// optimistic patch.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Executes the write → patch → settle → confirm protocol for one charger.
#[derive(Clone)]
pub struct ControlOperation {
    coordinator: Coordinator,
    settle_delay: Duration,
}

impl ControlOperation {
    pub fn new(coordinator: Coordinator) -> Self {
        Self::with_settle_delay(coordinator, DEFAULT_SETTLE_DELAY)
    }

    pub fn with_settle_delay(coordinator: Coordinator, settle_delay: Duration) -> Self {
        Self {
            coordinator,
            settle_delay,
        }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Write a single property and reconcile the snapshot.
    ///
    /// On a write error nothing is touched and the error propagates
    /// unchanged — there is no partial application and nothing to roll
    /// back. On success the snapshot shows the written value before this
    /// call returns; the confirming refresh later replaces it with server
    /// truth (last authoritative read wins).
    #[instrument(skip(self, value))]
    pub async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let serial = self.coordinator.serial().clone();
        debug!("setting {key} for charger {serial}");

        let mut patch = PropertyMap::new();
        patch.insert(key.to_string(), value.clone());
        self.coordinator
            .client()
            .set_properties(&serial, &patch)
            .await?;

        self.coordinator.apply_optimistic_patch(key, value);

        tokio::time::sleep(self.settle_delay).await;
        if let Err(err) = self.coordinator.request_refresh().await {
            // the write itself succeeded; the stale marker is the
            // coordinator's last error, so the control call still succeeds
            warn!("confirming refresh after writing {key} failed: {err}");
        }
        Ok(())
    }

    /// Convenience wrapper for boolean toggles.
    pub async fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set(key, serde_json::Value::Bool(value)).await
    }

    /// Convenience wrapper for integer settings.
    pub async fn set_i64(&self, key: &str, value: i64) -> Result<()> {
        self.set(key, serde_json::Value::from(value)).await
    }
}
