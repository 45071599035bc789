//! Subsystem contracts consumed by command handlers
//!
//! Hardware drivers live outside the command core. Handlers only see the
//! narrow async interfaces below; any subsystem shared between transports
//! provides its own internal synchronization.

mod device_config;
pub mod monitoring;
pub mod sim;

pub use device_config::{
    AccessPointConfig, CameraSettings, ConfigSection, DeviceConfig, FileConfigStore,
    NetworkUpdate, OtaCredentials, StreamingMode, WifiNetworkConfig,
};
pub use monitoring::BatteryStatus;

use anyhow::Result;
use async_trait::async_trait;

/// Persisted device configuration
///
/// Every setter is applied in memory and written through to the backing
/// store, so a value set here survives the next boot.
#[async_trait]
pub trait DeviceConfigStore: Send + Sync {
    /// Copy of the current configuration
    async fn snapshot(&self) -> DeviceConfig;

    async fn set_device_mode(&self, mode: StreamingMode) -> Result<()>;

    async fn set_ota_credentials(&self, ota: OtaCredentials) -> Result<()>;

    async fn set_led_duty_cycle(&self, percent: u8) -> Result<()>;

    async fn set_fan_duty_cycle(&self, percent: u8) -> Result<()>;

    async fn set_mdns_hostname(&self, hostname: String) -> Result<()>;

    async fn set_camera(&self, camera: CameraSettings) -> Result<()>;

    async fn set_access_point(&self, ap: AccessPointConfig) -> Result<()>;

    /// Insert a network, replacing any network with the same name
    async fn upsert_network(&self, network: WifiNetworkConfig) -> Result<()>;

    /// Apply `update` to the named network; `Ok(false)` if no such network
    async fn update_network(&self, name: &str, update: NetworkUpdate) -> Result<bool>;

    /// Remove the named network; `Ok(false)` if no such network
    async fn delete_network(&self, name: &str) -> Result<bool>;

    /// Restore defaults for one section
    async fn reset(&self, section: ConfigSection) -> Result<()>;

    /// Flush the configuration to the backing store
    async fn save(&self) -> Result<()>;
}

/// External illuminator LED driven by PWM
#[async_trait]
pub trait LedController: Send + Sync {
    async fn set_external_duty_cycle(&self, percent: u8) -> Result<()>;
}

/// Inclusive duty-cycle band a PWM output is limited to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutyBand {
    pub min: u8,
    pub max: u8,
}

impl DutyBand {
    /// Build a band, swapping the bounds if given in reverse order
    pub fn new(a: u8, b: u8) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn clamp(&self, percent: u8) -> u8 {
        percent.clamp(self.min, self.max)
    }
}

impl Default for DutyBand {
    fn default() -> Self {
        Self { min: 0, max: 100 }
    }
}

/// Cooling fan driven by PWM
#[async_trait]
pub trait FanController: Send + Sync {
    /// Band the fan duty is clamped into
    fn duty_band(&self) -> DutyBand;

    /// Duty cycle currently applied, in percent
    async fn duty_cycle(&self) -> u8;

    async fn set_duty_cycle(&self, percent: u8) -> Result<()>;
}

/// Aggregated current and battery sampling
#[async_trait]
pub trait MonitoringSource: Send + Sync {
    /// Latest filtered LED current; `None` when no reading is available
    async fn current_milli_amps(&self) -> Option<f32>;

    async fn battery_status(&self) -> BatteryStatus;
}

/// One access point seen during a scan
#[derive(Debug, Clone, PartialEq)]
pub struct AccessPoint {
    pub ssid: String,
    pub channel: u8,
    pub rssi: i8,
    pub mac: [u8; 6],
    pub auth_mode: u8,
}

/// Station connection state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting,
    Connected { ip_address: String },
    Error,
}

impl WifiState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WifiState::Disconnected => "disconnected",
            WifiState::Connecting => "connecting",
            WifiState::Connected { .. } => "connected",
            WifiState::Error => "error",
        }
    }
}

/// Wi-Fi station
#[async_trait]
pub trait WifiController: Send + Sync {
    /// Scan for access points, spending at most `timeout_ms` on the scan
    async fn scan_networks(&self, timeout_ms: u64) -> Result<Vec<AccessPoint>>;

    /// Start connecting with the stored networks
    async fn connect(&self) -> Result<()>;

    async fn state(&self) -> WifiState;
}

/// Image sensor
#[async_trait]
pub trait CameraController: Send + Sync {
    async fn apply(&self, settings: &CameraSettings) -> Result<()>;
}

/// Board identity and lifecycle control
#[async_trait]
pub trait SystemControl: Send + Sync {
    /// Station interface MAC address
    fn mac_address(&self) -> [u8; 6];

    /// Board name reported by `get_who_am_i`
    fn board(&self) -> &str;

    /// Firmware version
    fn version(&self) -> &str;

    /// Reboot the device; never called from a command execution context
    async fn restart(&self);

    /// Hand the device over to streaming
    async fn start_streaming(&self) -> Result<()>;

    /// Hold or release the startup auto-mode countdown
    async fn set_startup_paused(&self, paused: bool);

    /// A host wrote to a line channel; the startup countdown is cancelled
    async fn notify_command_received(&self);
}
