//! Snapshot-backed read and write surfaces
//!
//! Two small capabilities — a reader bound to one snapshot key and a writer
//! going through the optimistic control operation — are combined explicitly
//! into the concrete switch, number and sensor surfaces the host exposes.
//! A missing key reads as "value unknown", never as an error.

use serde_json::Value;
use tracing::debug;

use ixc_client::{ApiError, Result};
use ixc_core::{catalog, ChargingStatus};

use crate::control::ControlOperation;
use crate::coordinator::Coordinator;

/// Read capability: one property key bound to the coordinator's snapshot.
#[derive(Clone)]
pub struct PropertyReader {
    coordinator: Coordinator,
    key: &'static str,
}

impl PropertyReader {
    pub fn new(coordinator: Coordinator, key: &'static str) -> Self {
        Self { coordinator, key }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Whether the device has any data at all. Mirrors coordinator
    /// availability: no snapshot means unavailable, stale data does not.
    pub fn is_available(&self) -> bool {
        self.coordinator.is_available()
    }

    pub fn value(&self) -> Option<Value> {
        self.coordinator
            .current_snapshot()
            .and_then(|snapshot| snapshot.get(self.key).cloned())
    }

    pub fn bool_value(&self) -> Option<bool> {
        self.coordinator
            .current_snapshot()
            .and_then(|snapshot| snapshot.bool_value(self.key))
    }

    pub fn i64_value(&self) -> Option<i64> {
        self.coordinator
            .current_snapshot()
            .and_then(|snapshot| snapshot.i64_value(self.key))
    }

    pub fn f64_value(&self) -> Option<f64> {
        self.coordinator
            .current_snapshot()
            .and_then(|snapshot| snapshot.f64_value(self.key))
    }

    pub fn string_value(&self) -> Option<String> {
        self.coordinator
            .current_snapshot()
            .and_then(|snapshot| snapshot.str_value(self.key).map(str::to_string))
    }
}

/// Write capability: one writable key going through the optimistic control
/// operation.
#[derive(Clone)]
pub struct PropertyWriter {
    control: ControlOperation,
    key: &'static str,
}

impl PropertyWriter {
    /// Bind a writer to a key; rejected up front for read-only keys.
    pub fn new(control: ControlOperation, key: &'static str) -> Result<Self> {
        if !catalog::is_writable(key) {
            return Err(ApiError::ReadOnlyProperties {
                keys: vec![key.to_string()],
            });
        }
        Ok(Self { control, key })
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub async fn write(&self, value: Value) -> Result<()> {
        self.control.set(self.key, value).await
    }
}

impl std::fmt::Debug for PropertyWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyWriter")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// Boolean control surface (reader + writer).
pub struct Switch {
    reader: PropertyReader,
    writer: PropertyWriter,
}

impl Switch {
    /// Bind a switch to any writable boolean key.
    pub fn new(control: &ControlOperation, key: &'static str) -> Result<Self> {
        Ok(Self {
            reader: PropertyReader::new(control.coordinator().clone(), key),
            writer: PropertyWriter::new(control.clone(), key)?,
        })
    }

    /// Master charging toggle.
    pub fn charging_enable(control: &ControlOperation) -> Self {
        Self::known(control, catalog::CHARGING_ENABLE)
    }

    /// Single-phase mode toggle.
    pub fn single_phase(control: &ControlOperation) -> Self {
        Self::known(control, catalog::SINGLE_PHASE)
    }

    fn known(control: &ControlOperation, key: &'static str) -> Self {
        Self {
            reader: PropertyReader::new(control.coordinator().clone(), key),
            writer: PropertyWriter {
                control: control.clone(),
                key,
            },
        }
    }

    pub fn key(&self) -> &'static str {
        self.reader.key()
    }

    pub fn is_available(&self) -> bool {
        self.reader.is_available()
    }

    pub fn is_on(&self) -> Option<bool> {
        self.reader.bool_value()
    }

    pub async fn turn_on(&self) -> Result<()> {
        self.writer.write(Value::Bool(true)).await
    }

    pub async fn turn_off(&self) -> Result<()> {
        self.writer.write(Value::Bool(false)).await
    }
}

/// Read-only boolean display (no write path).
pub struct BinarySensor {
    reader: PropertyReader,
}

impl BinarySensor {
    pub fn new(coordinator: Coordinator, key: &'static str) -> Self {
        Self {
            reader: PropertyReader::new(coordinator, key),
        }
    }

    /// Whether boost mode is currently active on the device.
    pub fn boost_state(coordinator: Coordinator) -> Self {
        Self::new(coordinator, catalog::BOOST_STATE)
    }

    pub fn key(&self) -> &'static str {
        self.reader.key()
    }

    pub fn is_available(&self) -> bool {
        self.reader.is_available()
    }

    pub fn is_on(&self) -> Option<bool> {
        self.reader.bool_value()
    }
}

/// Upper bound of a number setting: fixed, or tracking a live property.
enum MaxBound {
    Fixed(i64),
    FromProperty { key: &'static str, fallback: i64 },
}

/// Integer control surface (reader + writer + range metadata).
pub struct NumberSetting {
    reader: PropertyReader,
    writer: PropertyWriter,
    min: i64,
    max: MaxBound,
    step: i64,
    unit: &'static str,
}

impl NumberSetting {
    /// Target charge current in amperes; ceiling follows the installation's
    /// `maximumCurrent` setting.
    pub fn target_current(control: &ControlOperation) -> Self {
        Self::known(
            control,
            catalog::TARGET_CURRENT,
            6,
            MaxBound::FromProperty {
                key: catalog::MAXIMUM_CURRENT,
                fallback: 16,
            },
            1,
            "A",
        )
    }

    /// Boost-mode charge current in amperes.
    pub fn boost_current(control: &ControlOperation) -> Self {
        Self::known(
            control,
            catalog::BOOST_CURRENT,
            6,
            MaxBound::FromProperty {
                key: catalog::MAXIMUM_CURRENT,
                fallback: 16,
            },
            1,
            "A",
        )
    }

    /// Installation-wide current ceiling in amperes.
    pub fn maximum_current(control: &ControlOperation) -> Self {
        Self::known(
            control,
            catalog::MAXIMUM_CURRENT,
            6,
            MaxBound::Fixed(16),
            1,
            "A",
        )
    }

    /// Boost timer duration in seconds.
    pub fn boost_time(control: &ControlOperation) -> Self {
        Self::known(
            control,
            catalog::BOOST_TIME,
            0,
            MaxBound::Fixed(86_400),
            60,
            "s",
        )
    }

    fn known(
        control: &ControlOperation,
        key: &'static str,
        min: i64,
        max: MaxBound,
        step: i64,
        unit: &'static str,
    ) -> Self {
        Self {
            reader: PropertyReader::new(control.coordinator().clone(), key),
            writer: PropertyWriter {
                control: control.clone(),
                key,
            },
            min,
            max,
            step,
            unit,
        }
    }

    pub fn key(&self) -> &'static str {
        self.reader.key()
    }

    pub fn is_available(&self) -> bool {
        self.reader.is_available()
    }

    pub fn value(&self) -> Option<i64> {
        self.reader.i64_value()
    }

    pub fn min_value(&self) -> i64 {
        self.min
    }

    /// Current upper bound; live bounds fall back when the property is
    /// missing from the snapshot.
    pub fn max_value(&self) -> i64 {
        match self.max {
            MaxBound::Fixed(max) => max,
            MaxBound::FromProperty { key, fallback } => self
                .reader
                .coordinator
                .current_snapshot()
                .and_then(|snapshot| snapshot.i64_value(key))
                .unwrap_or(fallback),
        }
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    pub fn unit(&self) -> &'static str {
        self.unit
    }

    /// Write a new value, clamped into the current range.
    pub async fn set(&self, value: i64) -> Result<()> {
        let clamped = value.clamp(self.min, self.max_value());
        if clamped != value {
            debug!(
                "clamped {} from {value} to {clamped}",
                self.reader.key()
            );
        }
        self.writer.write(Value::from(clamped)).await
    }
}

/// Read-only value display.
pub struct Sensor {
    reader: PropertyReader,
    unit: Option<&'static str>,
}

impl Sensor {
    pub fn new(coordinator: Coordinator, key: &'static str, unit: Option<&'static str>) -> Self {
        Self {
            reader: PropertyReader::new(coordinator, key),
            unit,
        }
    }

    pub fn key(&self) -> &'static str {
        self.reader.key()
    }

    pub fn unit(&self) -> Option<&'static str> {
        self.unit
    }

    pub fn is_available(&self) -> bool {
        self.reader.is_available()
    }

    pub fn value(&self) -> Option<Value> {
        self.reader.value()
    }

    pub fn f64_value(&self) -> Option<f64> {
        self.reader.f64_value()
    }

    pub fn string_value(&self) -> Option<String> {
        self.reader.string_value()
    }
}

/// The standard read-only sensor set for one charger.
pub fn charger_sensors(coordinator: &Coordinator) -> Vec<Sensor> {
    [
        (catalog::CURRENT_CHARGING_POWER, Some("W")),
        (catalog::TOTAL_ENERGY, Some("Wh")),
        (catalog::CHARGING_CURRENT, Some("A")),
        (catalog::CHARGING_CURRENT_L2, Some("A")),
        (catalog::CHARGING_CURRENT_L3, Some("A")),
        (catalog::BOOST_REMAINING, Some("s")),
        (catalog::SIGNAL, Some("%")),
        (catalog::CHARGING_STATUS, None),
        (catalog::SSID, None),
        (catalog::BSSID, None),
    ]
    .into_iter()
    .map(|(key, unit)| Sensor::new(coordinator.clone(), key, unit))
    .collect()
}

/// Parsed lifecycle status from the current snapshot.
pub fn charging_status(coordinator: &Coordinator) -> Option<ChargingStatus> {
    coordinator
        .current_snapshot()
        .and_then(|snapshot| snapshot.charging_status())
}
