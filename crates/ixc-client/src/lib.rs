//! ixc-client - HTTP client for the iXcommand EV charger vendor API
//!
//! Translates logical property get/set operations into HTTP calls against
//! the vendor endpoint and classifies outcomes into a small error taxonomy.
//! The client holds no device state; it is a pure request/response layer.

pub mod client;
pub mod error;
pub mod testing;

pub use client::{DeviceClient, API_BASE_URL};
pub use error::{ApiError, Result};
