//! Command handlers, grouped by the subsystem they act on
//!
//! Every handler receives an already validated payload, resolves what it
//! needs from the registry and performs one device action.

mod config;
mod device;
mod duty;
mod monitoring;
mod system;
mod wifi;

pub use config::{handle_get_config, handle_reset_config, handle_save_config, handle_update_camera};
pub use device::{
    handle_get_device_mode, handle_set_device_mode, handle_switch_mode,
    handle_update_ota_credentials,
};
pub use duty::{
    handle_get_fan_duty_cycle, handle_get_led_duty_cycle, handle_set_fan_duty_cycle,
    handle_set_led_duty_cycle,
};
pub use monitoring::{handle_get_battery_status, handle_get_led_current};
pub use system::{
    handle_get_serial, handle_get_who_am_i, handle_pause, handle_ping, handle_restart_device,
    handle_start_streaming,
};
pub use wifi::{
    handle_connect_wifi, handle_delete_network, handle_get_mdns_name, handle_get_wifi_status,
    handle_scan_networks, handle_set_mdns, handle_set_wifi, handle_update_ap_wifi,
    handle_update_wifi,
};

use crate::error::CommandError;
use crate::registry::{Registry, SubsystemKey};
use crate::subsystems::{
    CameraController, DeviceConfigStore, FanController, LedController, MonitoringSource,
    SystemControl, WifiController,
};
use iris_shared::limits::{RESTART_DELAY_MS, STREAMING_DELAY_MS};
use iris_shared::result::MESSAGE_KEY;
use iris_shared::{Payload, PayloadExt, ValidationError};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of one handler: result data or the reason it failed
pub type HandlerResult = Result<Payload, CommandError>;

/// Context passed to command handlers
#[derive(Debug, Clone)]
pub struct HandlerContext {
    pub registry: Arc<Registry>,
    /// Delay before a requested restart is carried out
    pub restart_delay: Duration,
    /// Delay before streaming is activated
    pub streaming_delay: Duration,
}

impl HandlerContext {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            restart_delay: Duration::from_millis(RESTART_DELAY_MS),
            streaming_delay: Duration::from_millis(STREAMING_DELAY_MS),
        }
    }

    fn config(&self) -> Result<&Arc<dyn DeviceConfigStore>, CommandError> {
        self.registry
            .config()
            .ok_or(CommandError::SubsystemUnavailable(SubsystemKey::DeviceConfig))
    }

    fn led(&self) -> Option<&Arc<dyn LedController>> {
        self.registry.led()
    }

    fn fan(&self) -> Result<&Arc<dyn FanController>, CommandError> {
        self.registry.fan().ok_or(CommandError::SubsystemUnavailable(SubsystemKey::Fan))
    }

    fn monitoring(&self) -> Result<&Arc<dyn MonitoringSource>, CommandError> {
        self.registry
            .monitoring()
            .ok_or(CommandError::SubsystemUnavailable(SubsystemKey::Monitoring))
    }

    fn wifi(&self) -> Result<&Arc<dyn WifiController>, CommandError> {
        self.registry.wifi().ok_or(CommandError::SubsystemUnavailable(SubsystemKey::Wifi))
    }

    fn camera(&self) -> Option<&Arc<dyn CameraController>> {
        self.registry.camera()
    }

    fn system(&self) -> Result<&Arc<dyn SystemControl>, CommandError> {
        self.registry
            .system()
            .ok_or(CommandError::SubsystemUnavailable(SubsystemKey::System))
    }
}

/// Result data holding only a message
fn message(text: impl Into<String>) -> Payload {
    fields([(MESSAGE_KEY, Value::String(text.into()))])
}

/// Result data from key/value pairs
fn fields<const N: usize>(pairs: [(&str, Value); N]) -> Payload {
    pairs.into_iter().map(|(key, value)| (key.to_owned(), value)).collect()
}

/// Integer field already checked against a catalog range
///
/// The catalog guarantees the value fits; the conversion still refuses to
/// truncate if a schema and a handler ever disagree.
fn bounded<T: TryFrom<i64>>(payload: &Payload, key: &'static str) -> Result<Option<T>, CommandError> {
    payload
        .get_i64(key)
        .map(|v| T::try_from(v).map_err(|_| CommandError::from(ValidationError::OutOfRange(key))))
        .transpose()
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fully populated registry of simulated subsystems

    use super::HandlerContext;
    use crate::registry::Registry;
    use crate::subsystems::sim::{SimCamera, SimFan, SimLed, SimMonitoring, SimSystem, SimWifi};
    use crate::subsystems::{DeviceConfig, DutyBand, FileConfigStore, WifiNetworkConfig};
    use iris_shared::Payload;
    use serde_json::Value;
    use std::sync::Arc;

    pub const TEST_MAC: [u8; 6] = [0x24, 0x0a, 0xc4, 0x01, 0xab, 0xcd];

    pub struct Rig {
        pub store: Arc<FileConfigStore>,
        pub led: Arc<SimLed>,
        pub fan: Arc<SimFan>,
        pub wifi: Arc<SimWifi>,
        pub camera: Arc<SimCamera>,
        pub system: Arc<SimSystem>,
        pub ctx: HandlerContext,
    }

    /// Every subsystem present; the config holds one network named "main"
    pub fn rig() -> Rig {
        let mut config = DeviceConfig::default();
        config.networks.push(WifiNetworkConfig {
            name: "main".into(),
            ssid: "home".into(),
            bssid: String::new(),
            password: "secret".into(),
            channel: 6,
            power: 52,
        });

        let store = Arc::new(FileConfigStore::in_memory(config));
        let led = Arc::new(SimLed::new());
        let fan = Arc::new(SimFan::new(DutyBand::new(20, 80), 50));
        let wifi = Arc::new(SimWifi::new(store.clone(), SimWifi::demo_access_points()));
        let camera = Arc::new(SimCamera::new());
        let system = Arc::new(SimSystem::new(TEST_MAC, "iris-s3", "1.2.0"));

        let registry = Registry::builder()
            .with_config(store.clone())
            .with_led(led.clone())
            .with_fan(fan.clone())
            .with_monitoring(Arc::new(SimMonitoring::new(Some(12.3456), 3845.0)))
            .with_wifi(wifi.clone())
            .with_camera(camera.clone())
            .with_system(system.clone())
            .build();

        Rig {
            store,
            led,
            fan,
            wifi,
            camera,
            system,
            ctx: HandlerContext::new(Arc::new(registry)),
        }
    }

    /// Payload from a `json!` object literal
    pub fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test payloads are objects"),
        }
    }

    /// Context with no subsystems at all
    pub fn empty() -> HandlerContext {
        HandlerContext::new(Arc::new(Registry::default()))
    }
}
