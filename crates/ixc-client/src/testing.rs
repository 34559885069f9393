//! Test utilities for ixc-client
//!
//! Provides an in-process mock of the vendor property endpoint plus a
//! [`TestServer`] that serves it on a random port and hands out a ready
//! [`DeviceClient`]. Used by the integration tests of this crate and the
//! coordinator crate.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::json;
use tokio::net::TcpListener;

use ixc_core::{ApiKey, PropertyMap};

use crate::{DeviceClient, Result};

/// In-memory stand-in for one charger behind the vendor API.
///
/// Keeps a property store, enforces the API key, and offers failure
/// injection knobs so tests can exercise every branch of the error taxonomy.
#[derive(Clone)]
pub struct MockCharger {
    state: Arc<MockState>,
}

struct MockState {
    api_key: String,
    properties: Mutex<PropertyMap>,
    read_count: AtomicUsize,
    write_count: AtomicUsize,
    fail_status: Mutex<Option<u16>>,
    response_delay: Mutex<Option<Duration>>,
    last_requested_keys: Mutex<Vec<String>>,
    /// When set, PATCH acknowledges but leaves the store untouched —
    /// simulates a device that rejects or reverts a written value.
    ignore_writes: AtomicBool,
}

impl MockCharger {
    /// Create a mock charger with a realistic default property set.
    pub fn new(api_key: &str) -> Self {
        Self::with_properties(api_key, Self::default_properties())
    }

    /// Create a mock charger with an explicit property store.
    pub fn with_properties(api_key: &str, properties: PropertyMap) -> Self {
        Self {
            state: Arc::new(MockState {
                api_key: api_key.to_string(),
                properties: Mutex::new(properties),
                read_count: AtomicUsize::new(0),
                write_count: AtomicUsize::new(0),
                fail_status: Mutex::new(None),
                response_delay: Mutex::new(None),
                last_requested_keys: Mutex::new(Vec::new()),
                ignore_writes: AtomicBool::new(false),
            }),
        }
    }

    /// The property set a factory-fresh mock reports.
    pub fn default_properties() -> PropertyMap {
        let mut map = PropertyMap::new();
        map.insert("boostCurrent".into(), json!(20));
        map.insert("targetCurrent".into(), json!(16));
        map.insert("singlePhase".into(), json!(false));
        map.insert("boostTime".into(), json!(3600));
        map.insert("maximumCurrent".into(), json!(32));
        map.insert("chargingEnable".into(), json!(true));
        map.insert("chargingCurrent".into(), json!(15.8));
        map.insert("boostRemaining".into(), json!(0));
        map.insert("chargingState".into(), json!(2));
        map.insert("signal".into(), json!(78));
        map.insert("boostState".into(), json!(false));
        map.insert("totalEnergy".into(), json!(1_284_500));
        map.insert("currentChargingPower".into(), json!(10890));
        map.insert("chargingCurrentL2".into(), json!(15.7));
        map.insert("chargingCurrentL3".into(), json!(15.9));
        map.insert("chargingStatus".into(), json!("CHARGING"));
        map.insert("ssid".into(), json!("garage-wifi"));
        map.insert("bssid".into(), json!("00:11:22:33:44:55"));
        map
    }

    /// Build the axum router for this charger.
    pub fn router(&self) -> Router {
        Router::new()
            .route(
                "/api/v1/thing/{serial}/properties",
                get(get_properties).patch(patch_properties),
            )
            .with_state(self.state.clone())
    }

    /// Current value of one property in the store.
    pub fn property(&self, key: &str) -> Option<serde_json::Value> {
        self.state.properties.lock().get(key).cloned()
    }

    /// Overwrite one property in the store.
    pub fn set_property(&self, key: &str, value: serde_json::Value) {
        self.state.properties.lock().insert(key.to_string(), value);
    }

    /// Replace the whole property store.
    pub fn set_properties(&self, properties: PropertyMap) {
        *self.state.properties.lock() = properties;
    }

    /// Number of GET requests observed.
    pub fn read_count(&self) -> usize {
        self.state.read_count.load(Ordering::SeqCst)
    }

    /// Number of PATCH requests observed.
    pub fn write_count(&self) -> usize {
        self.state.write_count.load(Ordering::SeqCst)
    }

    /// Force every subsequent request to fail with the given status, or
    /// restore normal operation with `None`.
    pub fn fail_with(&self, status: Option<u16>) {
        *self.state.fail_status.lock() = status;
    }

    /// Delay every subsequent response, e.g. to hold a refresh in flight.
    pub fn set_response_delay(&self, delay: Option<Duration>) {
        *self.state.response_delay.lock() = delay;
    }

    /// Acknowledge writes without applying them.
    pub fn ignore_writes(&self, ignore: bool) {
        self.state.ignore_writes.store(ignore, Ordering::SeqCst);
    }

    /// The `keys` parameters of the most recent read.
    pub fn last_requested_keys(&self) -> Vec<String> {
        self.state.last_requested_keys.lock().clone()
    }
}

fn authorized(state: &MockState, headers: &HeaderMap) -> bool {
    headers
        .get("X-API-KEY")
        .and_then(|value| value.to_str().ok())
        .map(|key| key == state.api_key)
        .unwrap_or(false)
}

async fn apply_failure_knobs(state: &MockState) -> Option<Response> {
    let delay = *state.response_delay.lock();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let forced = *state.fail_status.lock();
    forced.map(|status| {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, "injected failure").into_response()
    })
}

async fn get_properties(
    State(state): State<Arc<MockState>>,
    Path(_serial): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    state.read_count.fetch_add(1, Ordering::SeqCst);
    if let Some(failure) = apply_failure_knobs(&state).await {
        return failure;
    }
    if !authorized(&state, &headers) {
        return (StatusCode::UNAUTHORIZED, "invalid API key").into_response();
    }

    let requested: Vec<String> = query
        .as_deref()
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .filter(|(name, _)| name == "keys")
                .map(|(_, value)| value.into_owned())
                .collect()
        })
        .unwrap_or_default();
    *state.last_requested_keys.lock() = requested.clone();

    let store = state.properties.lock();
    let answer: PropertyMap = if requested.is_empty() {
        store.clone()
    } else {
        requested
            .iter()
            .filter_map(|key| store.get(key).map(|value| (key.clone(), value.clone())))
            .collect()
    };
    Json(answer).into_response()
}

async fn patch_properties(
    State(state): State<Arc<MockState>>,
    Path(_serial): Path<String>,
    headers: HeaderMap,
    Json(patch): Json<PropertyMap>,
) -> Response {
    state.write_count.fetch_add(1, Ordering::SeqCst);
    if let Some(failure) = apply_failure_knobs(&state).await {
        return failure;
    }
    if !authorized(&state, &headers) {
        return (StatusCode::UNAUTHORIZED, "invalid API key").into_response();
    }

    if !state.ignore_writes.load(Ordering::SeqCst) {
        let mut store = state.properties.lock();
        for (key, value) in &patch {
            store.insert(key.clone(), value.clone());
        }
    }
    Json(patch).into_response()
}

/// A test server that automatically shuts down when dropped.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: DeviceClient,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Serve the given mock charger and return a client pointed at it.
    pub async fn start(charger: &MockCharger, api_key: &ApiKey) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let router = charger.router();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        let base_url = format!("http://{addr}/api/v1");
        let client = DeviceClient::with_config(
            &base_url,
            api_key,
            Duration::from_secs(5),
            Duration::from_secs(2),
        )?;

        Ok(Self {
            addr,
            client,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Base URL of the running server, including the API prefix.
    pub fn base_url(&self) -> String {
        format!("http://{}/api/v1", self.addr)
    }

    pub fn client(&self) -> &DeviceClient {
        &self.client
    }

    /// Shutdown the server gracefully.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
