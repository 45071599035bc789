//! Liveness, identity and lifecycle handlers
//!
//! Restart and streaming activation are deferred onto the runtime: both
//! would tear down the transport task that is still writing the response.

use super::{fields, message, HandlerContext, HandlerResult};
use iris_shared::{Payload, PayloadExt};
use serde_json::Value;
use tracing::{error, info};

pub async fn handle_ping(_ctx: &HandlerContext, _payload: &Payload) -> HandlerResult {
    Ok(message("pong"))
}

/// Handle pause: hold or release the startup auto-mode countdown
pub async fn handle_pause(ctx: &HandlerContext, payload: &Payload) -> HandlerResult {
    let system = ctx.system()?;
    let paused = payload.get_bool("pause").unwrap_or(false);

    system.set_startup_paused(paused).await;
    Ok(message(if paused { "Startup paused" } else { "Startup resumed" }))
}

/// Handle restart_device
pub async fn handle_restart_device(ctx: &HandlerContext, _payload: &Payload) -> HandlerResult {
    let system = ctx.system()?.clone();
    let delay = ctx.restart_delay;

    info!("[SYSTEM] restart scheduled in {:?}", delay);
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        system.restart().await;
    });

    Ok(message("Device restarted"))
}

/// Handle start_streaming
pub async fn handle_start_streaming(ctx: &HandlerContext, _payload: &Payload) -> HandlerResult {
    let system = ctx.system()?.clone();
    let delay = ctx.streaming_delay;

    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Err(e) = system.start_streaming().await {
            error!("[SYSTEM] failed to start streaming: {:#}", e);
        }
    });

    Ok(message("Streaming starting"))
}

/// Handle get_serial: serial number and MAC of the station interface
pub async fn handle_get_serial(ctx: &HandlerContext, _payload: &Payload) -> HandlerResult {
    let mac = ctx.system()?.mac_address();

    let serial: String = mac.iter().map(|b| format!("{b:02X}")).collect();
    let mac = mac.iter().map(|b| format!("{b:02X}")).collect::<Vec<_>>().join(":");

    Ok(fields([("serial", Value::from(serial)), ("mac", Value::from(mac))]))
}

pub async fn handle_get_who_am_i(ctx: &HandlerContext, _payload: &Payload) -> HandlerResult {
    let system = ctx.system()?;
    Ok(fields([
        ("who_am_i", Value::from(system.board())),
        ("version", Value::from(system.version())),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::handlers::testing::rig;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_serial_formats() {
        let rig = rig();
        let data = handle_get_serial(&rig.ctx, &Payload::new()).await.unwrap();
        assert_eq!(data["serial"], json!("240AC401ABCD"));
        assert_eq!(data["mac"], json!("24:0A:C4:01:AB:CD"));
    }

    #[tokio::test]
    async fn test_who_am_i() {
        let rig = rig();
        let data = handle_get_who_am_i(&rig.ctx, &Payload::new()).await.unwrap();
        assert_eq!(data["who_am_i"], json!("iris-s3"));
        assert_eq!(data["version"], json!("1.2.0"));
    }

    #[tokio::test]
    async fn test_pause_toggles_countdown() {
        let rig = rig();
        let mut payload = Payload::new();
        payload.insert("pause".into(), json!(true));

        handle_pause(&rig.ctx, &payload).await.unwrap();
        assert!(rig.system.is_paused());

        payload.insert("pause".into(), json!(false));
        let data = handle_pause(&rig.ctx, &payload).await.unwrap();
        assert!(!rig.system.is_paused());
        assert_eq!(data["message"], json!("Startup resumed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_is_deferred() {
        let rig = rig();
        handle_restart_device(&rig.ctx, &Payload::new()).await.unwrap();
        assert!(!rig.system.restart_requested());

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert!(!rig.system.restart_requested());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(rig.system.restart_requested());
    }

    #[tokio::test(start_paused = true)]
    async fn test_streaming_is_deferred() {
        let rig = rig();
        handle_start_streaming(&rig.ctx, &Payload::new()).await.unwrap();
        assert!(!rig.system.is_streaming());

        tokio::time::sleep(Duration::from_millis(151)).await;
        assert!(rig.system.is_streaming());
    }
}
