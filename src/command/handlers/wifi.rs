//! Wi-Fi network, access point and mDNS handlers

use super::{bounded, fields, message, HandlerContext, HandlerResult};
use crate::error::CommandError;
use crate::subsystems::{AccessPoint, NetworkUpdate, WifiNetworkConfig, WifiState};
use iris_shared::limits::DEFAULT_SCAN_TIMEOUT_MS;
use iris_shared::{Payload, PayloadExt};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

fn owned(payload: &Payload, key: &str) -> Option<String> {
    payload.get_str(key).map(str::to_owned)
}

/// Handle set_wifi: store a named network, replacing one with the same name
pub async fn handle_set_wifi(ctx: &HandlerContext, payload: &Payload) -> HandlerResult {
    let config = ctx.config()?;

    let network = WifiNetworkConfig {
        name: owned(payload, "name").unwrap_or_default(),
        ssid: owned(payload, "ssid").unwrap_or_default(),
        bssid: owned(payload, "bssid").unwrap_or_default(),
        password: owned(payload, "password").unwrap_or_default(),
        channel: bounded(payload, "channel")?.unwrap_or(0),
        power: payload.get_i64("power").unwrap_or(0),
    };

    if network.name.is_empty() {
        return Err(CommandError::rule("network name must not be empty"));
    }

    info!("[WIFI] storing network '{}' (ssid '{}')", network.name, network.ssid);
    config.upsert_network(network).await?;
    Ok(message("Wifi network saved"))
}

/// Handle update_wifi: merge given fields into an existing network
pub async fn handle_update_wifi(ctx: &HandlerContext, payload: &Payload) -> HandlerResult {
    let config = ctx.config()?;
    let name = payload.get_str("name").unwrap_or_default();

    let update = NetworkUpdate {
        ssid: owned(payload, "ssid"),
        password: owned(payload, "password"),
        channel: bounded(payload, "channel")?,
        power: payload.get_i64("power"),
    };

    if !config.update_network(name, update).await? {
        return Err(CommandError::rule("network not found"));
    }
    Ok(message("Wifi network updated"))
}

/// Handle update_ap_wifi: merge given fields into the setup access point
pub async fn handle_update_ap_wifi(ctx: &HandlerContext, payload: &Payload) -> HandlerResult {
    let config = ctx.config()?;
    let mut ap = config.snapshot().await.access_point;

    if let Some(ssid) = owned(payload, "ssid") {
        ap.ssid = ssid;
    }
    if let Some(password) = owned(payload, "password") {
        ap.password = password;
    }
    if let Some(channel) = bounded(payload, "channel")? {
        ap.channel = channel;
    }

    config.set_access_point(ap).await?;
    Ok(message("AP config updated"))
}

pub async fn handle_delete_network(ctx: &HandlerContext, payload: &Payload) -> HandlerResult {
    let config = ctx.config()?;
    let name = payload.get_str("name").unwrap_or_default();

    if name.is_empty() {
        return Err(CommandError::rule("network name must not be empty"));
    }
    if !config.delete_network(name).await? {
        return Err(CommandError::rule("network not found"));
    }

    info!("[WIFI] network '{}' deleted", name);
    Ok(message("Wifi network deleted"))
}

pub async fn handle_connect_wifi(ctx: &HandlerContext, _payload: &Payload) -> HandlerResult {
    ctx.wifi()?.connect().await?;
    Ok(message("Wifi connection started"))
}

pub async fn handle_get_wifi_status(ctx: &HandlerContext, _payload: &Payload) -> HandlerResult {
    let state = ctx.wifi()?.state().await;

    let mut data = fields([("wifi_state", Value::from(state.as_str()))]);
    if let WifiState::Connected { ip_address } = state {
        data.insert("ip_address".into(), Value::from(ip_address));
    }
    Ok(data)
}

fn access_point_json(ap: &AccessPoint) -> Value {
    let mac = ap.mac.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(":");
    json!({
        "ssid": ap.ssid,
        "channel": ap.channel,
        "rssi": ap.rssi,
        "mac_address": mac,
        "auth_mode": ap.auth_mode,
    })
}

/// Handle scan_networks
///
/// The scan is bounded by the requested timeout even if the controller
/// overruns it.
pub async fn handle_scan_networks(ctx: &HandlerContext, payload: &Payload) -> HandlerResult {
    let wifi = ctx.wifi()?;
    let timeout_ms = payload
        .get_i64("timeout_ms")
        .and_then(|ms| u64::try_from(ms).ok())
        .unwrap_or(DEFAULT_SCAN_TIMEOUT_MS);

    let scan = tokio::time::timeout(Duration::from_millis(timeout_ms), wifi.scan_networks(timeout_ms));
    let networks = match scan.await {
        Ok(result) => result?,
        Err(_) => {
            warn!("[WIFI] scan exceeded {} ms", timeout_ms);
            return Err(CommandError::rule("scan timed out"));
        }
    };

    info!("[WIFI] scan found {} networks", networks.len());
    let networks: Vec<Value> = networks.iter().map(access_point_json).collect();
    Ok(fields([("networks", Value::Array(networks))]))
}

pub async fn handle_set_mdns(ctx: &HandlerContext, payload: &Payload) -> HandlerResult {
    let config = ctx.config()?;
    let hostname = payload.get_str("hostname").unwrap_or_default();

    if hostname.is_empty() {
        return Err(CommandError::rule("hostname must not be empty"));
    }

    config.set_mdns_hostname(hostname.to_owned()).await?;
    Ok(message("MDNS hostname set"))
}

pub async fn handle_get_mdns_name(ctx: &HandlerContext, _payload: &Payload) -> HandlerResult {
    let hostname = ctx.config()?.snapshot().await.mdns_hostname;
    Ok(fields([("hostname", Value::from(hostname))]))
}
