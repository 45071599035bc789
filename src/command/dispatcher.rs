//! Command dispatcher - parses, validates and routes commands to handlers

use super::handlers::{self, HandlerContext, HandlerResult};
use crate::error::CommandError;
use crate::registry::Registry;
use iris_shared::message::MessageError;
use iris_shared::{
    catalog, payload, BatchEnvelope, CommandMessage, CommandResult, Envelope, OperationId, Payload,
    Reply, Request,
};
use serde_json::Value;
use tracing::{debug, warn};

/// Routes commands from every transport to their handlers
///
/// Both entry points always produce an [`Envelope`]; parse, validation and
/// handler failures all come back as a failure result.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    ctx: HandlerContext,
}

impl CommandDispatcher {
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }

    pub fn registry(&self) -> &Registry {
        &self.ctx.registry
    }

    /// Execute `op` with a raw JSON body
    ///
    /// An empty body is an empty payload.
    pub async fn execute_by_type(&self, op: OperationId, raw: &[u8]) -> Envelope {
        let result = match payload::parse(raw) {
            Ok(payload) => self.execute_payload(op, payload).await,
            Err(e) => {
                debug!("Unparseable body for {}: {}", op, e);
                Err(CommandError::Parse)
            }
        };
        finish(Some(op), result)
    }

    /// Execute a self-describing `{"command": ..., "data": ...}` message
    pub async fn execute_by_envelope(&self, raw: &[u8]) -> Envelope {
        match payload::parse(raw) {
            Ok(doc) => self.execute_document(doc).await,
            Err(e) => {
                debug!("Unparseable message: {}", e);
                finish(None, Err(CommandError::Parse))
            }
        }
    }

    /// Execute one line: a single message or a `{"commands": [...]}` batch
    ///
    /// Batch entries run in order and each gets its own envelope; a single
    /// message is answered exactly as [`execute_by_envelope`](Self::execute_by_envelope) would.
    pub async fn execute_line(&self, raw: &[u8]) -> Reply {
        let doc = match payload::parse(raw) {
            Ok(doc) => doc,
            Err(e) => {
                debug!("Unparseable line: {}", e);
                return Reply::Single(finish(None, Err(CommandError::Parse)));
            }
        };

        match Request::from_payload(doc) {
            Request::Single(doc) => Reply::Single(self.execute_document(doc).await),
            Request::Batch(items) => {
                debug!("Executing batch of {}", items.len());
                let mut results = Vec::with_capacity(items.len());
                for item in items {
                    let envelope = match item {
                        Value::Object(doc) => self.execute_document(doc).await,
                        _ => finish(None, Err(CommandError::Parse)),
                    };
                    results.push(envelope);
                }
                Reply::Batch(BatchEnvelope { results })
            }
        }
    }

    async fn execute_document(&self, doc: Payload) -> Envelope {
        match CommandMessage::from_payload(doc) {
            Ok(message) => {
                let result = self.execute_payload(message.command, message.data).await;
                finish(Some(message.command), result)
            }
            Err(MessageError::Unknown(name)) => {
                if let Some(name) = name {
                    debug!("Rejected message: {}", name);
                }
                finish(None, Err(CommandError::UnknownOperation))
            }
            Err(MessageError::MalformedData) => finish(None, Err(CommandError::Parse)),
        }
    }

    async fn execute_payload(&self, op: OperationId, payload: Payload) -> HandlerResult {
        debug!("Executing command: {}", op);
        catalog::validate(op, &payload)?;
        self.dispatch(op, &payload).await
    }

    async fn dispatch(&self, op: OperationId, payload: &Payload) -> HandlerResult {
        let ctx = &self.ctx;
        match op {
            OperationId::Ping => handlers::handle_ping(ctx, payload).await,
            OperationId::Pause => handlers::handle_pause(ctx, payload).await,
            OperationId::SetWifi => handlers::handle_set_wifi(ctx, payload).await,
            OperationId::UpdateWifi => handlers::handle_update_wifi(ctx, payload).await,
            OperationId::UpdateApWifi => handlers::handle_update_ap_wifi(ctx, payload).await,
            OperationId::DeleteNetwork => handlers::handle_delete_network(ctx, payload).await,
            OperationId::ConnectWifi => handlers::handle_connect_wifi(ctx, payload).await,
            OperationId::GetWifiStatus => handlers::handle_get_wifi_status(ctx, payload).await,
            OperationId::ScanNetworks => handlers::handle_scan_networks(ctx, payload).await,
            OperationId::SetMdns => handlers::handle_set_mdns(ctx, payload).await,
            OperationId::GetMdnsName => handlers::handle_get_mdns_name(ctx, payload).await,
            OperationId::UpdateCamera => handlers::handle_update_camera(ctx, payload).await,
            OperationId::SaveConfig => handlers::handle_save_config(ctx, payload).await,
            OperationId::GetConfig => handlers::handle_get_config(ctx, payload).await,
            OperationId::ResetConfig => handlers::handle_reset_config(ctx, payload).await,
            OperationId::RestartDevice => handlers::handle_restart_device(ctx, payload).await,
            OperationId::StartStreaming => handlers::handle_start_streaming(ctx, payload).await,
            OperationId::SetDeviceMode => handlers::handle_set_device_mode(ctx, payload).await,
            OperationId::SwitchMode => handlers::handle_switch_mode(ctx, payload).await,
            OperationId::GetDeviceMode => handlers::handle_get_device_mode(ctx, payload).await,
            OperationId::UpdateOtaCredentials => {
                handlers::handle_update_ota_credentials(ctx, payload).await
            }
            OperationId::SetLedDutyCycle => handlers::handle_set_led_duty_cycle(ctx, payload).await,
            OperationId::GetLedDutyCycle => handlers::handle_get_led_duty_cycle(ctx, payload).await,
            OperationId::SetFanDutyCycle => handlers::handle_set_fan_duty_cycle(ctx, payload).await,
            OperationId::GetFanDutyCycle => handlers::handle_get_fan_duty_cycle(ctx, payload).await,
            OperationId::GetSerial => handlers::handle_get_serial(ctx, payload).await,
            OperationId::GetLedCurrent => handlers::handle_get_led_current(ctx, payload).await,
            OperationId::GetBatteryStatus => handlers::handle_get_battery_status(ctx, payload).await,
            OperationId::GetWhoAmI => handlers::handle_get_who_am_i(ctx, payload).await,
        }
    }
}

/// Convert a handler outcome into its wire envelope
fn finish(op: Option<OperationId>, result: HandlerResult) -> Envelope {
    let op = op.map_or("<none>", |op| op.as_str());
    let result = match result {
        Ok(data) => {
            debug!("  Command completed: {}", op);
            CommandResult::success(data)
        }
        Err(e) => {
            warn!("  Command failed: {}: {}", op, e);
            CommandResult::failure(e.to_string())
        }
    };
    Envelope::from(result)
}
