//! Current and battery readings

use super::{fields, HandlerContext, HandlerResult};
use crate::error::CommandError;
use iris_shared::Payload;
use serde_json::Value;

/// Handle get_led_current: latest filtered LED current in mA
pub async fn handle_get_led_current(ctx: &HandlerContext, _payload: &Payload) -> HandlerResult {
    let milli_amps = ctx
        .monitoring()?
        .current_milli_amps()
        .await
        .ok_or_else(|| CommandError::rule("LED current reading unavailable"))?;

    Ok(fields([("led_current_ma", Value::from(format!("{milli_amps:.3}")))]))
}

/// Handle get_battery_status: pack voltage and estimated state of charge
pub async fn handle_get_battery_status(ctx: &HandlerContext, _payload: &Payload) -> HandlerResult {
    let battery = ctx.monitoring()?.battery_status().await;
    if !battery.valid {
        return Err(CommandError::rule("battery voltage unavailable"));
    }

    Ok(fields([
        ("voltage_mv", Value::from(format!("{:.2}", battery.voltage_mv))),
        ("percentage", Value::from(format!("{:.1}", battery.percent))),
    ]))
}
