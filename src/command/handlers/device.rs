//! Streaming mode and OTA credential handlers

use super::{fields, message, HandlerContext, HandlerResult};
use crate::error::CommandError;
use crate::subsystems::StreamingMode;
use iris_shared::limits::MIN_OTA_PORT;
use iris_shared::{Payload, PayloadExt};
use serde_json::Value;
use tracing::info;

/// Handle set_device_mode: numeric mode code
pub async fn handle_set_device_mode(ctx: &HandlerContext, payload: &Payload) -> HandlerResult {
    let config = ctx.config()?;

    let mode = payload
        .get_i64("mode")
        .and_then(StreamingMode::from_code)
        .ok_or_else(|| CommandError::rule("unsupported mode"))?;

    config.set_device_mode(mode).await?;
    info!("[MODE] device mode set to {}", mode.label());
    Ok(message("Device mode set"))
}

/// Handle switch_mode: mode by name, applied on the next boot
pub async fn handle_switch_mode(ctx: &HandlerContext, payload: &Payload) -> HandlerResult {
    let config = ctx.config()?;

    let mode = payload
        .get_str("mode")
        .and_then(StreamingMode::from_name)
        .ok_or_else(|| CommandError::rule("Invalid mode - use 'uvc', 'wifi', or 'auto'"))?;

    config.set_device_mode(mode).await?;
    info!("[MODE] switching to {} on restart", mode.label());
    Ok(message("Device mode switched, restart to apply"))
}

pub async fn handle_get_device_mode(ctx: &HandlerContext, _payload: &Payload) -> HandlerResult {
    let mode = ctx.config()?.snapshot().await.device_mode;
    Ok(fields([
        ("mode", Value::from(mode.label())),
        ("value", Value::from(mode.code())),
    ]))
}

/// Handle update_ota_credentials
///
/// An empty login keeps the stored one, and a port below the lowest allowed
/// OTA port keeps the stored port. A given password always replaces it.
pub async fn handle_update_ota_credentials(ctx: &HandlerContext, payload: &Payload) -> HandlerResult {
    let config = ctx.config()?;
    let mut ota = config.snapshot().await.ota;

    if let Some(login) = payload.get_str("login").filter(|l| !l.is_empty()) {
        ota.login = login.to_owned();
    }
    if let Some(password) = payload.get_str("password") {
        ota.password = password.to_owned();
    }
    if let Some(port) = payload
        .get_i64("port")
        .filter(|p| *p >= MIN_OTA_PORT)
        .and_then(|p| u16::try_from(p).ok())
    {
        ota.port = port;
    }

    config.set_ota_credentials(ota).await?;
    Ok(message("OTA Config set"))
}
