//! LED and fan PWM duty-cycle handlers

use super::{bounded, fields, message, HandlerContext, HandlerResult};
use crate::error::CommandError;
use iris_shared::result::MESSAGE_KEY;
use iris_shared::{Payload, ValidationError};
use serde_json::Value;
use tracing::{debug, info};

const DUTY_CYCLE: &str = "dutyCycle";

fn duty_cycle(payload: &Payload) -> Result<u8, CommandError> {
    bounded::<u8>(payload, DUTY_CYCLE)?
        .filter(|percent| *percent <= 100)
        .ok_or(CommandError::Validation(ValidationError::OutOfRange(DUTY_CYCLE)))
}

/// Handle set_led_duty_cycle
///
/// The value is persisted first; the external LED is only driven live when
/// an LED controller is registered.
pub async fn handle_set_led_duty_cycle(ctx: &HandlerContext, payload: &Payload) -> HandlerResult {
    let config = ctx.config()?;
    let percent = duty_cycle(payload)?;

    config.set_led_duty_cycle(percent).await?;

    match ctx.led() {
        Some(led) => led.set_external_duty_cycle(percent).await?,
        None => debug!("[LED] no controller, duty {}% stored only", percent),
    }

    info!("[LED] duty cycle set to {}%", percent);
    Ok(message("LED duty cycle set"))
}

pub async fn handle_get_led_duty_cycle(ctx: &HandlerContext, _payload: &Payload) -> HandlerResult {
    let duty = ctx.config()?.snapshot().await.led_external_pwm_duty_cycle;
    Ok(fields([("led_external_pwm_duty_cycle", Value::from(duty))]))
}

/// Handle set_fan_duty_cycle
///
/// The requested value is clamped into the fan's duty band; the clamped
/// value is what gets applied and persisted.
pub async fn handle_set_fan_duty_cycle(ctx: &HandlerContext, payload: &Payload) -> HandlerResult {
    let config = ctx.config()?;
    let fan = ctx.fan()?;
    let requested = duty_cycle(payload)?;

    let percent = fan.duty_band().clamp(requested);
    if percent != requested {
        debug!("[FAN] requested {}% clamped to {}%", requested, percent);
    }

    fan.set_duty_cycle(percent).await?;
    config.set_fan_duty_cycle(percent).await?;

    info!("[FAN] duty cycle set to {}%", percent);
    Ok(fields([
        (MESSAGE_KEY, Value::from("Fan duty cycle set")),
        ("fan_pwm_duty_cycle", Value::from(percent)),
    ]))
}

pub async fn handle_get_fan_duty_cycle(ctx: &HandlerContext, _payload: &Payload) -> HandlerResult {
    let duty = ctx.config()?.snapshot().await.fan_pwm_duty_cycle;
    Ok(fields([("fan_pwm_duty_cycle", Value::from(duty))]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::handlers::testing::{empty, rig};
    use crate::subsystems::{DeviceConfigStore, FanController};
    use serde_json::json;

    fn duty(percent: i64) -> Payload {
        let mut payload = Payload::new();
        payload.insert(DUTY_CYCLE.into(), json!(percent));
        payload
    }

    #[tokio::test]
    async fn test_led_duty_is_persisted_and_applied() {
        let rig = rig();
        handle_set_led_duty_cycle(&rig.ctx, &duty(40)).await.unwrap();

        assert_eq!(rig.store.snapshot().await.led_external_pwm_duty_cycle, 40);
        assert_eq!(rig.led.writes(), 1);
        assert_eq!(rig.led.duty(), 40);

        let data = handle_get_led_duty_cycle(&rig.ctx, &Payload::new()).await.unwrap();
        assert_eq!(data["led_external_pwm_duty_cycle"], json!(40));
    }

    #[tokio::test]
    async fn test_out_of_range_duty_is_rejected() {
        let rig = rig();
        let err = handle_set_led_duty_cycle(&rig.ctx, &duty(150)).await.unwrap_err();
        assert_eq!(err.to_string(), "dutyCycle out of range");
        assert_eq!(rig.led.writes(), 0);
    }

    #[tokio::test]
    async fn test_fan_duty_is_clamped_then_persisted() {
        let rig = rig();
        let data = handle_set_fan_duty_cycle(&rig.ctx, &duty(95)).await.unwrap();

        assert_eq!(data["fan_pwm_duty_cycle"], json!(80));
        assert_eq!(rig.fan.duty_cycle().await, 80);
        assert_eq!(rig.store.snapshot().await.fan_pwm_duty_cycle, 80);

        handle_set_fan_duty_cycle(&rig.ctx, &duty(0)).await.unwrap();
        assert_eq!(rig.fan.duty_cycle().await, 20);
        assert_eq!(rig.fan.writes(), 2);
    }

    #[tokio::test]
    async fn test_fan_requires_subsystems() {
        let err = handle_set_fan_duty_cycle(&empty(), &duty(30)).await.unwrap_err();
        assert_eq!(err.to_string(), "device config unavailable");
    }
}
