//! Charging lifecycle status vocabulary

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status reported by the `chargingStatus` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargingStatus {
    Init,
    Idle,
    Connected,
    Charging,
    ChargingWithVentilation,
    ControlPilotError,
    Error,
}

impl ChargingStatus {
    /// All statuses the device is known to report.
    pub const ALL: &'static [ChargingStatus] = &[
        ChargingStatus::Init,
        ChargingStatus::Idle,
        ChargingStatus::Connected,
        ChargingStatus::Charging,
        ChargingStatus::ChargingWithVentilation,
        ChargingStatus::ControlPilotError,
        ChargingStatus::Error,
    ];

    /// Wire representation, e.g. `CHARGING_WITH_VENTILATION`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChargingStatus::Init => "INIT",
            ChargingStatus::Idle => "IDLE",
            ChargingStatus::Connected => "CONNECTED",
            ChargingStatus::Charging => "CHARGING",
            ChargingStatus::ChargingWithVentilation => "CHARGING_WITH_VENTILATION",
            ChargingStatus::ControlPilotError => "CONTROL_PILOT_ERROR",
            ChargingStatus::Error => "ERROR",
        }
    }

    /// Whether this status indicates a fault condition.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            ChargingStatus::ControlPilotError | ChargingStatus::Error
        )
    }

    /// Whether the vehicle is actively drawing power.
    pub fn is_charging(&self) -> bool {
        matches!(
            self,
            ChargingStatus::Charging | ChargingStatus::ChargingWithVentilation
        )
    }
}

impl fmt::Display for ChargingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChargingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown charging status: {s}"))
    }
}
