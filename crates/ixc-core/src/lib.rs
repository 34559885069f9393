//! ixc-core - Core types for the iXcommand EV charger bridge
//!
//! This crate provides the property catalog, the snapshot model and the
//! device identity types shared by the API client and the coordinator.
//! It performs no I/O.

pub mod catalog;
pub mod device;
pub mod snapshot;
pub mod status;

pub use device::{ApiKey, InvalidSerial, SerialNumber};
pub use snapshot::{PropertyMap, Snapshot};
pub use status::ChargingStatus;
