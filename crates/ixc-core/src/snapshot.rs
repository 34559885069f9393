//! Snapshot model
//!
//! A snapshot is the coordinator's belief about the device's current
//! property values at one point in time, plus a freshness marker. It is
//! exclusively owned and mutated by the coordinator; everything else reads
//! copies.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog;
use crate::status::ChargingStatus;

/// Mapping from property key to its loosely typed scalar value.
///
/// A `BTreeMap` keeps the key set stable under re-encoding: nothing the
/// server returned is dropped or reordered.
pub type PropertyMap = BTreeMap<String, Value>;

/// Point-in-time view of the device's properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Property values as last confirmed (or optimistically patched).
    pub properties: PropertyMap,
    /// When the underlying full read completed.
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    /// Create a snapshot stamped with the current time.
    pub fn new(properties: PropertyMap) -> Self {
        Self {
            properties,
            fetched_at: Utc::now(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Boolean value of a property; `None` if missing or not a boolean.
    pub fn bool_value(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Integer value of a property; `None` if missing or not an integer.
    pub fn i64_value(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    /// Numeric value of a property; `None` if missing or not a number.
    pub fn f64_value(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    /// String value of a property; `None` if missing or not a string.
    pub fn str_value(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Parsed `chargingStatus`. An unrecognized status string reads as
    /// `None` rather than failing the snapshot.
    pub fn charging_status(&self) -> Option<ChargingStatus> {
        self.str_value(catalog::CHARGING_STATUS)
            .and_then(|s| s.parse().ok())
    }

    /// Copy-on-write single-key patch. The freshness marker is kept: a
    /// patch is an unconfirmed annotation, not a new read.
    pub fn with_patched(&self, key: &str, value: Value) -> Self {
        let mut properties = self.properties.clone();
        properties.insert(key.to_string(), value);
        Self {
            properties,
            fetched_at: self.fetched_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn sample() -> Snapshot {
        let mut map = PropertyMap::new();
        map.insert(catalog::CHARGING_ENABLE.into(), json!(true));
        map.insert(catalog::TARGET_CURRENT.into(), json!(16));
        map.insert(catalog::CURRENT_CHARGING_POWER.into(), json!(3680.5));
        map.insert(catalog::CHARGING_STATUS.into(), json!("CHARGING"));
        map.insert(catalog::SSID.into(), json!("garage-wifi"));
        Snapshot::new(map)
    }

    #[test]
    fn typed_accessors() {
        let snap = sample();
        assert_eq!(snap.bool_value(catalog::CHARGING_ENABLE), Some(true));
        assert_eq!(snap.i64_value(catalog::TARGET_CURRENT), Some(16));
        assert_eq!(
            snap.f64_value(catalog::CURRENT_CHARGING_POWER),
            Some(3680.5)
        );
        assert_eq!(snap.str_value(catalog::SSID), Some("garage-wifi"));
        assert_eq!(snap.charging_status(), Some(ChargingStatus::Charging));
    }

    #[test]
    fn missing_or_mistyped_reads_as_none() {
        let snap = sample();
        assert_eq!(snap.bool_value(catalog::SIGNAL), None);
        assert_eq!(snap.bool_value(catalog::TARGET_CURRENT), None);
        assert_eq!(snap.i64_value(catalog::SSID), None);
    }

    #[test]
    fn unknown_status_reads_as_none() {
        let snap = sample().with_patched(catalog::CHARGING_STATUS, json!("WARP_SPEED"));
        assert_eq!(snap.charging_status(), None);
    }

    #[test]
    fn patch_is_copy_on_write() {
        let snap = sample();
        let patched = snap.with_patched(catalog::CHARGING_ENABLE, json!(false));

        assert_eq!(snap.bool_value(catalog::CHARGING_ENABLE), Some(true));
        assert_eq!(patched.bool_value(catalog::CHARGING_ENABLE), Some(false));
        assert_eq!(patched.fetched_at, snap.fetched_at);
        assert_eq!(patched.len(), snap.len());
    }

    #[test]
    fn encoding_preserves_every_key() {
        let snap = sample();
        let encoded = serde_json::to_string(&snap).unwrap();
        let decoded: Snapshot = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.properties, snap.properties);
        let keys: Vec<_> = decoded.properties.keys().collect();
        let original: Vec<_> = snap.properties.keys().collect();
        assert_eq!(keys, original);
    }
}
