//! Integration tests for ixc-client
//!
//! These tests spin up the in-process mock charger and drive the client
//! against it over real HTTP, so the request shape and the error taxonomy
//! stay in sync with what the wire actually carries.

use serde_json::json;

use ixc_client::testing::{MockCharger, TestServer};
use ixc_client::ApiError;
use ixc_core::{catalog, ApiKey, PropertyMap, SerialNumber};

const API_KEY: &str = "integration-test-key";

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
async fn reads_full_property_set() {
    let (_charger, server) = start_server().await;

    let properties = server
        .client()
        .get_all_properties(&serial())
        .await
        .expect("full read failed");

    assert_eq!(properties.len(), catalog::ALL_READABLE.len());
    for key in catalog::ALL_READABLE {
        assert!(properties.contains_key(*key), "missing {key}");
    }
}

#[tokio::test]
async fn read_sends_repeated_keys_parameters() {
    let (charger, server) = start_server().await;

    let keys = [catalog::CHARGING_ENABLE, catalog::TARGET_CURRENT];
    let properties = server
        .client()
        .get_properties(&serial(), &keys)
        .await
        .expect("read failed");

    assert_eq!(
        charger.last_requested_keys(),
        vec!["chargingEnable".to_string(), "targetCurrent".to_string()]
    );
    assert_eq!(properties.len(), 2);
    assert_eq!(properties["chargingEnable"], json!(true));
    assert_eq!(properties["targetCurrent"], json!(16));
}

#[tokio::test]
async fn read_returns_only_keys_the_server_knows() {
    let mut store = PropertyMap::new();
    store.insert("chargingEnable".into(), json!(false));
    let charger = MockCharger::with_properties(API_KEY, store);
    let server = TestServer::start(&charger, &ApiKey::new(API_KEY))
        .await
        .unwrap();

    let properties = server
        .client()
        .get_properties(&serial(), &[catalog::CHARGING_ENABLE, catalog::SIGNAL])
        .await
        .expect("read failed");

    // the server answered a subset; the client passes it through untouched
    assert_eq!(properties.len(), 1);
    assert_eq!(properties["chargingEnable"], json!(false));
}

#[tokio::test]
async fn wrong_api_key_maps_to_authentication_error() {
    let charger = MockCharger::new(API_KEY);
    let server = TestServer::start(&charger, &ApiKey::new("wrong-key"))
        .await
        .unwrap();

    let err = server
        .client()
        .get_all_properties(&serial())
        .await
        .expect_err("expected auth failure");
    assert!(matches!(err, ApiError::Authentication));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn server_failure_maps_to_status_error() {
    let (charger, server) = start_server().await;
    charger.fail_with(Some(503));

    let err = server
        .client()
        .get_all_properties(&serial())
        .await
        .expect_err("expected status failure");
    match err {
        ApiError::Status { status, ref body } => {
            assert_eq!(status, 503);
            assert!(body.contains("injected failure"));
        }
        other => panic!("expected Status, got {other:?}"),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn write_applies_patch_and_returns_acknowledgement() {
    let (charger, server) = start_server().await;

    let mut patch = PropertyMap::new();
    patch.insert("chargingEnable".into(), json!(false));

    let ack = server
        .client()
        .set_properties(&serial(), &patch)
        .await
        .expect("write failed");

    assert_eq!(ack["chargingEnable"], json!(false));
    assert_eq!(charger.property("chargingEnable"), Some(json!(false)));
    assert_eq!(charger.write_count(), 1);
}

#[tokio::test]
async fn read_only_write_issues_zero_requests() {
    let (charger, server) = start_server().await;

    let mut patch = PropertyMap::new();
    patch.insert("chargingEnable".into(), json!(false));
    patch.insert("totalEnergy".into(), json!(0));

    let err = server
        .client()
        .set_properties(&serial(), &patch)
        .await
        .expect_err("expected validation failure");
    match err {
        ApiError::ReadOnlyProperties { keys } => {
            assert_eq!(keys, vec!["totalEnergy".to_string()]);
        }
        other => panic!("expected ReadOnlyProperties, got {other:?}"),
    }

    assert_eq!(charger.read_count(), 0);
    assert_eq!(charger.write_count(), 0);
}

#[tokio::test]
async fn write_auth_failure_propagates() {
    let charger = MockCharger::new(API_KEY);
    let server = TestServer::start(&charger, &ApiKey::new("revoked"))
        .await
        .unwrap();

    let mut patch = PropertyMap::new();
    patch.insert("targetCurrent".into(), json!(10));

    let err = server
        .client()
        .set_properties(&serial(), &patch)
        .await
        .expect_err("expected auth failure");
    assert!(matches!(err, ApiError::Authentication));
    // the write was rejected by the server, not applied
    assert_eq!(charger.property("targetCurrent"), Some(json!(16)));
}

#[tokio::test]
async fn test_connection_probes_one_property() {
    let (charger, server) = start_server().await;

    let ok = server.client().test_connection(&serial()).await.unwrap();
    assert!(ok);
    assert_eq!(charger.last_requested_keys(), vec!["boostCurrent".to_string()]);
}

#[tokio::test]
async fn test_connection_swallows_request_errors() {
    let (charger, server) = start_server().await;
    charger.fail_with(Some(500));

    let ok = server.client().test_connection(&serial()).await.unwrap();
    assert!(!ok);
}

#[tokio::test]
async fn test_connection_propagates_credential_errors() {
    let charger = MockCharger::new(API_KEY);
    let server = TestServer::start(&charger, &ApiKey::new("revoked"))
        .await
        .unwrap();

    let err = server
        .client()
        .test_connection(&serial())
        .await
        .expect_err("expected auth failure");
    assert!(matches!(err, ApiError::Authentication));
}
