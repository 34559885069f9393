//! ixc-coordinator - Device state synchronization for the iXcommand bridge
//!
//! Owns the single authoritative snapshot of a charger's properties, keeps
//! it fresh with a periodic poll, and implements the optimistic write
//! protocol that keeps the snapshot consistent between a control command
//! and the next confirmed read.
//!
//! The concurrency model is deliberately small: the [`Coordinator`] is the
//! only mutator of the snapshot (wholesale replace on refresh, copy-on-write
//! patch on optimistic writes), refreshes are single-flight, and every other
//! component only reads copies.

pub mod control;
pub mod coordinator;
pub mod setup;
pub mod surface;

pub use control::{ControlOperation, DEFAULT_SETTLE_DELAY};
pub use coordinator::{Coordinator, RefreshOutcome, DEFAULT_REFRESH_INTERVAL};
pub use setup::{probe_device, reauthenticate, validate_device, SetupOutcome};
pub use surface::{
    charger_sensors, charging_status, BinarySensor, NumberSetting, PropertyReader, PropertyWriter,
    Sensor, Switch,
};
