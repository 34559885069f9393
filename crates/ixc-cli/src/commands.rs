//! Command implementations for ixc

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use serde_json::Value;

use ixc_client::{DeviceClient, API_BASE_URL};
use ixc_coordinator::{
    probe_device, reauthenticate, validate_device, ControlOperation, Coordinator, SetupOutcome,
};
use ixc_core::{catalog, ApiKey, SerialNumber, Snapshot};

use crate::config::{Config, DeviceConfig};

fn resolve_base_url(flag: Option<&str>, config: &Config) -> Option<String> {
    flag.map(str::to_string).or_else(|| config.base_url.clone())
}

fn build_client(base_url: Option<&str>, api_key: &ApiKey) -> Result<DeviceClient> {
    let client = match base_url {
        Some(url) => DeviceClient::with_base_url(url, api_key)?,
        None => DeviceClient::new(api_key)?,
    };
    Ok(client)
}

fn open_device(config: &Config, base_url: Option<&str>) -> Result<(DeviceClient, SerialNumber)> {
    let device = config.device()?;
    let base = resolve_base_url(base_url, config);
    let client = build_client(base.as_deref(), &device.api_key)?;
    Ok((client, device.serial_number.clone()))
}

/// Register a charger and persist the validated credential.
pub async fn setup(
    config_path: Option<&Path>,
    base_url: Option<&str>,
    serial: &str,
    api_key: &str,
) -> Result<()> {
    let mut config = Config::load(config_path)?;
    let key = ApiKey::new(api_key);
    let base = resolve_base_url(base_url, &config);
    let client = build_client(base.as_deref(), &key)?;

    match validate_device(&client, serial).await {
        SetupOutcome::Success => {
            let serial: SerialNumber = serial.parse().map_err(|err| anyhow!("{err}"))?;
            config.device = Some(DeviceConfig {
                serial_number: serial.clone(),
                api_key: key,
            });
            if let Some(url) = base_url {
                config.base_url = Some(url.to_string());
            }
            config.store(config_path)?;
            println!("charger {serial} registered");
            Ok(())
        }
        SetupOutcome::InvalidSerial => {
            bail!("invalid serial number format (expected XXX-XXX-XXX, e.g. A1B-C2D-E3F)")
        }
        SetupOutcome::InvalidAuth => bail!("the vendor API rejected the key"),
        SetupOutcome::CannotConnect => bail!("cannot reach the vendor API for charger {serial}"),
    }
}

/// Validate a replacement API key and persist it on success.
pub async fn reauth(
    config_path: Option<&Path>,
    base_url: Option<&str>,
    api_key: &str,
) -> Result<()> {
    let mut config = Config::load(config_path)?;
    let serial = config.device()?.serial_number.clone();
    let base = resolve_base_url(base_url, &config);
    let key = ApiKey::new(api_key);

    match reauthenticate(base.as_deref().unwrap_or(API_BASE_URL), &serial, &key).await {
        SetupOutcome::Success => {
            if let Some(device) = config.device.as_mut() {
                device.api_key = key;
            }
            config.store(config_path)?;
            println!("replacement key stored for charger {serial}");
            Ok(())
        }
        SetupOutcome::InvalidAuth => bail!("the vendor API rejected the replacement key"),
        _ => bail!("cannot reach the vendor API for charger {serial}"),
    }
}

/// One-shot read of the full property set.
pub async fn status(config_path: Option<&Path>, base_url: Option<&str>) -> Result<()> {
    let config = Config::load(config_path)?;
    let (client, serial) = open_device(&config, base_url)?;

    let properties = client.get_all_properties(&serial).await?;
    let snapshot = Snapshot::new(properties);
    println!("charger {serial}");
    print_snapshot(&snapshot);
    Ok(())
}

/// Poll the charger and print every refreshed snapshot until Ctrl-C.
pub async fn watch(
    config_path: Option<&Path>,
    base_url: Option<&str>,
    interval_secs: u64,
) -> Result<()> {
    let config = Config::load(config_path)?;
    let (client, serial) = open_device(&config, base_url)?;
    let interval = Duration::from_secs(interval_secs.max(1));

    let coordinator = Coordinator::with_interval(client, serial.clone(), interval);
    coordinator
        .start()
        .await
        .map_err(|err| anyhow!("initial refresh failed: {err}"))?;
    let mut auth_rx = coordinator.subscribe_auth_failures();
    auth_rx.borrow_and_update();

    println!("watching charger {serial}; press Ctrl-C to stop");
    if let Some(snapshot) = coordinator.current_snapshot() {
        print_snapshot(&snapshot);
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = auth_rx.changed() => {
                if changed.is_ok() {
                    coordinator.shutdown();
                    bail!("API key rejected; run `ixc reauth --api-key <key>`");
                }
            }
            _ = tokio::time::sleep(interval) => {
                if let Some(err) = coordinator.current_error() {
                    println!("(data stale, last poll failed: {err})");
                }
                if let Some(snapshot) = coordinator.current_snapshot() {
                    print_snapshot(&snapshot);
                }
            }
        }
    }

    coordinator.shutdown();
    Ok(())
}

/// Toggle the master charging switch via the optimistic control path.
pub async fn set_charging(
    config_path: Option<&Path>,
    base_url: Option<&str>,
    enabled: bool,
) -> Result<()> {
    let config = Config::load(config_path)?;
    let (client, serial) = open_device(&config, base_url)?;

    let coordinator = Coordinator::new(client, serial.clone());
    let control = ControlOperation::new(coordinator.clone());
    control.set_bool(catalog::CHARGING_ENABLE, enabled).await?;

    let confirmed = coordinator
        .current_snapshot()
        .and_then(|snapshot| snapshot.bool_value(catalog::CHARGING_ENABLE));
    match confirmed {
        Some(state) => println!(
            "charging {} for charger {serial}",
            if state { "enabled" } else { "disabled" }
        ),
        None => println!("write accepted for charger {serial}"),
    }
    Ok(())
}

/// Write one property via the optimistic control path.
pub async fn set(
    config_path: Option<&Path>,
    base_url: Option<&str>,
    key: &str,
    value: &str,
) -> Result<()> {
    let config = Config::load(config_path)?;
    let (client, serial) = open_device(&config, base_url)?;

    // numbers and booleans parse as JSON; anything else is a plain string
    let value: Value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));

    let coordinator = Coordinator::new(client, serial.clone());
    let control = ControlOperation::new(coordinator.clone());
    control.set(key, value).await?;

    match coordinator
        .current_snapshot()
        .and_then(|snapshot| snapshot.get(key).cloned())
    {
        Some(confirmed) => println!("{key} = {confirmed} on charger {serial}"),
        None => println!("write accepted for charger {serial}"),
    }
    Ok(())
}

/// Probe the connection with the stored credential.
pub async fn test(config_path: Option<&Path>, base_url: Option<&str>) -> Result<()> {
    let config = Config::load(config_path)?;
    let (client, serial) = open_device(&config, base_url)?;

    match probe_device(&client, &serial).await {
        SetupOutcome::Success => {
            println!("charger {serial} reachable");
            Ok(())
        }
        SetupOutcome::InvalidAuth => {
            bail!("the vendor API rejected the stored key; run `ixc reauth`")
        }
        _ => bail!("cannot reach charger {serial}"),
    }
}

fn print_snapshot(snapshot: &Snapshot) {
    println!(
        "-- {} ({} properties)",
        snapshot.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"),
        snapshot.len()
    );
    for (key, value) in &snapshot.properties {
        println!("  {key:<24} {value}");
    }
    if let Some(status) = snapshot.charging_status() {
        let power = snapshot
            .f64_value(catalog::CURRENT_CHARGING_POWER)
            .unwrap_or(0.0);
        println!("  => {status}, {power} W");
    }
}
