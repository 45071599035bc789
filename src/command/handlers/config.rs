//! Configuration and camera settings handlers

use super::{bounded, message, HandlerContext, HandlerResult};
use crate::error::CommandError;
use crate::subsystems::ConfigSection;
use anyhow::Context;
use iris_shared::{Payload, PayloadExt};
use serde_json::Value;
use tracing::{debug, info};

pub async fn handle_save_config(ctx: &HandlerContext, _payload: &Payload) -> HandlerResult {
    ctx.config()?.save().await?;
    Ok(message("Config saved"))
}

/// Handle get_config: the full stored configuration as result data
pub async fn handle_get_config(ctx: &HandlerContext, _payload: &Payload) -> HandlerResult {
    let snapshot = ctx.config()?.snapshot().await;
    match serde_json::to_value(snapshot).context("failed to serialize device config")? {
        Value::Object(data) => Ok(data),
        _ => Err(anyhow::anyhow!("device config is not an object").into()),
    }
}

pub async fn handle_reset_config(ctx: &HandlerContext, payload: &Payload) -> HandlerResult {
    let config = ctx.config()?;
    let name = payload.get_str("section").unwrap_or_default();

    let section = ConfigSection::from_name(name).ok_or_else(|| {
        CommandError::rule("Invalid section - use 'all', 'device', 'camera', 'wifi' or 'mdns'")
    })?;

    config.reset(section).await?;
    info!("[CONFIG] section '{}' reset to defaults", name);
    Ok(message("Config reset"))
}

/// Handle update_camera
///
/// Given fields are merged into the stored settings. The merged settings are
/// applied to the sensor when one is registered, then persisted.
pub async fn handle_update_camera(ctx: &HandlerContext, payload: &Payload) -> HandlerResult {
    let config = ctx.config()?;
    let mut camera = config.snapshot().await.camera;

    if let Some(vflip) = bounded(payload, "vflip")? {
        camera.vflip = vflip;
    }
    if let Some(hflip) = bounded(payload, "hflip")? {
        camera.hflip = hflip;
    }
    if let Some(framesize) = bounded(payload, "framesize")? {
        camera.framesize = framesize;
    }
    if let Some(quality) = bounded(payload, "quality")? {
        camera.quality = quality;
    }
    if let Some(brightness) = bounded(payload, "brightness")? {
        camera.brightness = brightness;
    }

    match ctx.camera() {
        Some(sensor) => sensor.apply(&camera).await?,
        None => debug!("[CAMERA] no sensor, settings stored only"),
    }

    config.set_camera(camera).await?;
    Ok(message("Camera config updated"))
}
