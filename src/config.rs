//! Process configuration
//!
//! Loaded once at startup from an optional TOML file. Every field has a
//! default, so a partial file only overrides what it names.

use crate::subsystems::DutyBand;
use crate::transport::SerialConfig;
use anyhow::{bail, Context as _, Result};
use iris_shared::limits::{RESTART_DELAY_MS, STREAMING_DELAY_MS};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the persisted device config lives; in memory only when unset
    pub config_path: Option<PathBuf>,
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub log_filter: String,
    pub device: DeviceSection,
    pub http: HttpSection,
    pub serial: SerialSection,
    pub line_tcp: LineTcpSection,
    pub fan: FanSection,
    pub timing: TimingSection,
    pub monitoring: MonitoringSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            log_filter: "info".into(),
            device: DeviceSection::default(),
            http: HttpSection::default(),
            serial: SerialSection::default(),
            line_tcp: LineTcpSection::default(),
            fan: FanSection::default(),
            timing: TimingSection::default(),
            monitoring: MonitoringSection::default(),
        }
    }
}

/// Board identity
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceSection {
    pub board: String,
    pub version: String,
    /// Station MAC, colon separated hex
    pub mac: String,
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            board: "iris-s3".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            mac: "24:0A:C4:00:00:01".into(),
        }
    }
}

impl DeviceSection {
    pub fn mac_bytes(&self) -> Result<[u8; 6]> {
        parse_mac(&self.mac)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    pub bind: String,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:80".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SerialSection {
    /// Serial device; the serial channel is off when unset
    pub port: Option<String>,
    pub baud_rate: u32,
    pub reopen_delay_ms: u64,
}

impl Default for SerialSection {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 115_200,
            reopen_delay_ms: 1000,
        }
    }
}

impl SerialSection {
    pub fn serial_config(&self) -> Option<SerialConfig> {
        self.port.as_ref().map(|port| SerialConfig {
            port: port.clone(),
            baud_rate: self.baud_rate,
            reopen_delay: Duration::from_millis(self.reopen_delay_ms),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LineTcpSection {
    /// Address of the TCP line listener; off when unset
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FanSection {
    pub min_duty: u8,
    pub max_duty: u8,
}

impl Default for FanSection {
    fn default() -> Self {
        Self {
            min_duty: 20,
            max_duty: 100,
        }
    }
}

impl FanSection {
    pub fn band(&self) -> DutyBand {
        DutyBand::new(self.min_duty, self.max_duty)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingSection {
    pub restart_delay_ms: u64,
    pub streaming_delay_ms: u64,
    /// Simulated Wi-Fi scan duration
    pub scan_latency_ms: u64,
}

impl Default for TimingSection {
    fn default() -> Self {
        Self {
            restart_delay_ms: RESTART_DELAY_MS,
            streaming_delay_ms: STREAMING_DELAY_MS,
            scan_latency_ms: 1500,
        }
    }
}

impl TimingSection {
    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    pub fn streaming_delay(&self) -> Duration {
        Duration::from_millis(self.streaming_delay_ms)
    }

    pub fn scan_latency(&self) -> Duration {
        Duration::from_millis(self.scan_latency_ms)
    }
}

/// Readings reported by the simulated monitoring source
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringSection {
    pub led_current_ma: Option<f32>,
    pub battery_mv: f32,
}

impl Default for MonitoringSection {
    fn default() -> Self {
        Self {
            led_current_ma: Some(42.0),
            battery_mv: 3900.0,
        }
    }
}

impl AppConfig {
    /// Read `path`, failing if it is missing or malformed
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self =
            toml::from_str(&raw).with_context(|| format!("invalid config in {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Config from `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

/// Parse `AA:BB:CC:DD:EE:FF` (either case) into bytes
pub fn parse_mac(text: &str) -> Result<[u8; 6]> {
    let mut mac = [0u8; 6];
    let mut parts = text.split(':');

    for byte in mac.iter_mut() {
        let part = parts.next().with_context(|| format!("MAC address too short: {text}"))?;
        if part.len() != 2 {
            bail!("invalid MAC address: {text}");
        }
        *byte = u8::from_str_radix(part, 16).with_context(|| format!("invalid MAC address: {text}"))?;
    }

    if parts.next().is_some() {
        bail!("MAC address too long: {text}");
    }
    Ok(mac)
}
