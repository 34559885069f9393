//! Setup and re-authentication flows
//!
//! Thin leaf flows over [`DeviceClient::test_connection`]: registration
//! validates the serial format before any network traffic, and credential
//! rotation probes a freshly built client around the replacement key. The
//! caller persists the replacement credential once the probe succeeds and
//! constructs future coordinators from it.

use tracing::debug;

use ixc_client::{ApiError, DeviceClient};
use ixc_core::{ApiKey, SerialNumber};

/// Outcome of a device registration or re-authentication probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupOutcome {
    /// Device reachable with the given credential
    Success,
    /// Serial number does not match the vendor format; nothing was sent
    InvalidSerial,
    /// The API key was rejected
    InvalidAuth,
    /// Device or vendor API unreachable
    CannotConnect,
}

/// Validate a device registration: serial format first (no network on a
/// malformed serial), then a minimal connection probe.
pub async fn validate_device(client: &DeviceClient, serial: &str) -> SetupOutcome {
    let serial: SerialNumber = match serial.parse() {
        Ok(serial) => serial,
        Err(err) => {
            debug!("rejecting registration: {err}");
            return SetupOutcome::InvalidSerial;
        }
    };
    probe_device(client, &serial).await
}

/// Probe an already-validated device/credential pair.
pub async fn probe_device(client: &DeviceClient, serial: &SerialNumber) -> SetupOutcome {
    match client.test_connection(serial).await {
        Ok(true) => SetupOutcome::Success,
        Ok(false) => SetupOutcome::CannotConnect,
        Err(ApiError::Authentication) => SetupOutcome::InvalidAuth,
        Err(err) => {
            debug!("connection probe failed: {err}");
            SetupOutcome::CannotConnect
        }
    }
}

/// Probe a replacement credential by building a new client around it.
///
/// Credential rotation never mutates an existing client; on
/// [`SetupOutcome::Success`] the caller persists the key and builds future
/// clients and coordinators from it.
pub async fn reauthenticate(
    base_url: &str,
    serial: &SerialNumber,
    replacement: &ApiKey,
) -> SetupOutcome {
    let client = match DeviceClient::with_base_url(base_url, replacement) {
        Ok(client) => client,
        Err(err) => {
            debug!("cannot build client for replacement key: {err}");
            return SetupOutcome::CannotConnect;
        }
    };
    probe_device(&client, serial).await
}
