//! Property catalog for the charger's vendor API
//!
//! Every attribute the charger exposes is addressed by a fixed property key.
//! The catalog classifies each key as readable and/or writable; writable keys
//! are a strict subset of the readable ones. Keys absent from both sets are
//! simply unknown — the catalog has no failure mode of its own.

/// Boost-mode charge current in amperes
pub const BOOST_CURRENT: &str = "boostCurrent";
/// Target charge current in amperes
pub const TARGET_CURRENT: &str = "targetCurrent";
/// Single-phase mode toggle
pub const SINGLE_PHASE: &str = "singlePhase";
/// Boost timer duration in seconds
pub const BOOST_TIME: &str = "boostTime";
/// Installation-wide current ceiling in amperes
pub const MAXIMUM_CURRENT: &str = "maximumCurrent";
/// Master charging enable toggle
pub const CHARGING_ENABLE: &str = "chargingEnable";
/// Measured charge current on L1 in amperes
pub const CHARGING_CURRENT: &str = "chargingCurrent";
/// Seconds remaining on the boost timer
pub const BOOST_REMAINING: &str = "boostRemaining";
/// Raw charge-state flag
pub const CHARGING_STATE: &str = "chargingState";
/// WiFi signal strength in percent
pub const SIGNAL: &str = "signal";
/// Whether boost mode is currently active
pub const BOOST_STATE: &str = "boostState";
/// Lifetime energy delivered in watt-hours
pub const TOTAL_ENERGY: &str = "totalEnergy";
/// Instantaneous charging power in watts
pub const CURRENT_CHARGING_POWER: &str = "currentChargingPower";
/// Measured charge current on L2 in amperes
pub const CHARGING_CURRENT_L2: &str = "chargingCurrentL2";
/// Measured charge current on L3 in amperes
pub const CHARGING_CURRENT_L3: &str = "chargingCurrentL3";
/// Lifecycle status, see [`crate::ChargingStatus`]
pub const CHARGING_STATUS: &str = "chargingStatus";
/// WiFi network name
pub const SSID: &str = "ssid";
/// WiFi access point identifier
pub const BSSID: &str = "bssid";

/// All readable properties — the default read-set for a full refresh.
pub const ALL_READABLE: &[&str] = &[
    BOOST_CURRENT,
    TARGET_CURRENT,
    SINGLE_PHASE,
    BOOST_TIME,
    MAXIMUM_CURRENT,
    CHARGING_ENABLE,
    CHARGING_CURRENT,
    BOOST_REMAINING,
    CHARGING_STATE,
    SIGNAL,
    BOOST_STATE,
    TOTAL_ENERGY,
    CURRENT_CHARGING_POWER,
    CHARGING_CURRENT_L2,
    CHARGING_CURRENT_L3,
    CHARGING_STATUS,
    SSID,
    BSSID,
];

/// Writable properties. Invariant: WRITABLE ⊆ ALL_READABLE.
pub const WRITABLE: &[&str] = &[
    BOOST_CURRENT,
    TARGET_CURRENT,
    SINGLE_PHASE,
    BOOST_TIME,
    MAXIMUM_CURRENT,
    CHARGING_ENABLE,
];

/// Whether the given key can be read via the property endpoint.
pub fn is_readable(key: &str) -> bool {
    ALL_READABLE.contains(&key)
}

/// Whether the given key may be written via the property endpoint.
pub fn is_writable(key: &str) -> bool {
    WRITABLE.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writable_is_subset_of_readable() {
        for key in WRITABLE {
            assert!(
                ALL_READABLE.contains(key),
                "writable key {key} missing from readable set"
            );
        }
    }

    #[test]
    fn no_duplicate_keys() {
        let mut readable: Vec<_> = ALL_READABLE.to_vec();
        readable.sort_unstable();
        readable.dedup();
        assert_eq!(readable.len(), ALL_READABLE.len());

        let mut writable: Vec<_> = WRITABLE.to_vec();
        writable.sort_unstable();
        writable.dedup();
        assert_eq!(writable.len(), WRITABLE.len());
    }

    #[test]
    fn classification() {
        assert!(is_readable(TOTAL_ENERGY));
        assert!(!is_writable(TOTAL_ENERGY));
        assert!(is_readable(CHARGING_ENABLE));
        assert!(is_writable(CHARGING_ENABLE));
        assert!(!is_readable("noSuchProperty"));
        assert!(!is_writable("noSuchProperty"));
    }
}
