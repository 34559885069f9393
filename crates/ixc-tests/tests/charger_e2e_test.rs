//! End-to-end tests for the charger bridge
//!
//! These tests walk the whole lifecycle the host application would drive:
//! register a charger, start the coordinator, read sensors, toggle and set
//! values through the optimistic control path, lose the credential, and
//! re-authenticate — all against the in-process mock vendor endpoint.

use std::time::Duration;

use serde_json::json;

use ixc_client::testing::{MockCharger, TestServer};
use ixc_coordinator::{
    charger_sensors, probe_device, reauthenticate, validate_device, BinarySensor,
    ControlOperation, Coordinator, NumberSetting, SetupOutcome, Switch,
};
use ixc_core::{catalog, ApiKey, ChargingStatus, SerialNumber};

const API_KEY: &str = "e2e-test-key";
const SETTLE: Duration = Duration::from_millis(50);

fn serial() -> SerialNumber {
    "ABC-DEF-123".parse().unwrap()
}

async fn start_server() -> (MockCharger, TestServer) {
    let charger = MockCharger::new(API_KEY);
    let server = TestServer::start(&charger, &ApiKey::new(API_KEY))
        .await
        .expect("failed to start test server");
    (charger, server)
}

#[tokio::test]
async fn registration_rejects_bad_serial_before_any_traffic() {
    let (charger, server) = start_server().await;

    let outcome = validate_device(server.client(), "AB-CDE-123").await;
    assert_eq!(outcome, SetupOutcome::InvalidSerial);
    assert_eq!(charger.read_count(), 0);

    let outcome = validate_device(server.client(), "ABC-DEF-123").await;
    assert_eq!(outcome, SetupOutcome::Success);
    assert_eq!(charger.read_count(), 1);
}

#[tokio::test]
async fn full_lifecycle_register_watch_control() {
    let (charger, server) = start_server().await;

    // registration probe
    assert_eq!(
        validate_device(server.client(), serial().as_str()).await,
        SetupOutcome::Success
    );

    // coordinator comes up with a blocking first refresh
    let coordinator =
        Coordinator::with_interval(server.client().clone(), serial(), Duration::from_millis(100));
    coordinator.start().await.expect("start failed");
    let control = ControlOperation::with_settle_delay(coordinator.clone(), SETTLE);

    // sensors see live data
    let sensors = charger_sensors(&coordinator);
    assert!(sensors.iter().all(|sensor| sensor.is_available()));
    let status = coordinator
        .current_snapshot()
        .and_then(|snapshot| snapshot.charging_status());
    assert_eq!(status, Some(ChargingStatus::Charging));

    // toggle charging off through the optimistic path
    let charging = Switch::charging_enable(&control);
    charging.turn_off().await.expect("turn_off failed");
    assert_eq!(charging.is_on(), Some(false));
    assert_eq!(charger.property(catalog::CHARGING_ENABLE), Some(json!(false)));

    // raise the target current; the device confirms it on refresh
    let target = NumberSetting::target_current(&control);
    target.set(20).await.expect("set failed");
    assert_eq!(target.value(), Some(20));

    // the boost display never writes
    let boost = BinarySensor::boost_state(coordinator.clone());
    assert_eq!(boost.is_on(), Some(false));

    coordinator.shutdown();
}

#[tokio::test]
async fn device_side_revert_wins_over_optimistic_state() {
    let (charger, server) = start_server().await;

    let coordinator =
        Coordinator::with_interval(server.client().clone(), serial(), Duration::from_secs(30));
    coordinator.start().await.unwrap();
    let control = ControlOperation::with_settle_delay(coordinator.clone(), SETTLE);

    // the charger acknowledges the write but keeps charging enabled (e.g.
    // an installation lock); the confirming read restores the truth
    charger.ignore_writes(true);
    let charging = Switch::charging_enable(&control);
    charging.turn_off().await.expect("turn_off failed");
    assert_eq!(charging.is_on(), Some(true));

    coordinator.shutdown();
}

#[tokio::test]
async fn revoked_key_surfaces_reauth_and_recovery_works() {
    let (charger, server) = start_server().await;

    let coordinator =
        Coordinator::with_interval(server.client().clone(), serial(), Duration::from_millis(50));
    coordinator.start().await.unwrap();
    let mut auth_rx = coordinator.subscribe_auth_failures();
    auth_rx.borrow_and_update();

    // key revoked mid-flight: the poll loop keeps the last snapshot and
    // raises the re-auth signal instead of crashing
    charger.fail_with(Some(401));
    tokio::time::timeout(Duration::from_secs(2), auth_rx.changed())
        .await
        .expect("auth signal not fired")
        .unwrap();
    assert!(coordinator.is_available());
    coordinator.shutdown();

    // the replacement key is probed through a brand-new client
    charger.fail_with(None);
    let outcome = reauthenticate(&server.base_url(), &serial(), &ApiKey::new(API_KEY)).await;
    assert_eq!(outcome, SetupOutcome::Success);

    let outcome = reauthenticate(&server.base_url(), &serial(), &ApiKey::new("still-wrong")).await;
    assert_eq!(outcome, SetupOutcome::InvalidAuth);
}

#[tokio::test]
async fn unreachable_device_probes_as_cannot_connect() {
    let (charger, server) = start_server().await;
    charger.fail_with(Some(502));

    let outcome = probe_device(server.client(), &serial()).await;
    assert_eq!(outcome, SetupOutcome::CannotConnect);
}
