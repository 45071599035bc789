//! Device configuration and its file-backed store

use super::DeviceConfigStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Streaming mode selected at boot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamingMode {
    #[default]
    Setup,
    Uvc,
    Wifi,
}

impl StreamingMode {
    /// Numeric code used by `set_device_mode` and `get_device_mode`
    pub fn code(&self) -> i64 {
        match self {
            StreamingMode::Setup => 0,
            StreamingMode::Uvc => 1,
            StreamingMode::Wifi => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(StreamingMode::Setup),
            1 => Some(StreamingMode::Uvc),
            2 => Some(StreamingMode::Wifi),
            _ => None,
        }
    }

    /// Mode names accepted by `switch_mode`; "auto" is an alias for setup
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "uvc" => Some(StreamingMode::Uvc),
            "wifi" => Some(StreamingMode::Wifi),
            "setup" | "auto" => Some(StreamingMode::Setup),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StreamingMode::Setup => "Setup",
            StreamingMode::Uvc => "UVC",
            StreamingMode::Wifi => "WiFi",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtaCredentials {
    pub login: String,
    pub password: String,
    pub port: u16,
}

impl Default for OtaCredentials {
    fn default() -> Self {
        Self {
            login: "iris".into(),
            password: String::new(),
            port: 3232,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraSettings {
    pub vflip: u8,
    pub hflip: u8,
    pub framesize: u8,
    pub quality: u8,
    pub brightness: i8,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            vflip: 0,
            hflip: 0,
            framesize: 5,
            quality: 7,
            brightness: 2,
        }
    }
}

/// A named station network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiNetworkConfig {
    pub name: String,
    pub ssid: String,
    #[serde(default)]
    pub bssid: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub channel: u8,
    #[serde(default)]
    pub power: i64,
}

/// Partial update for a stored network
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkUpdate {
    pub ssid: Option<String>,
    pub password: Option<String>,
    pub channel: Option<u8>,
    pub power: Option<i64>,
}

impl NetworkUpdate {
    fn apply(self, network: &mut WifiNetworkConfig) {
        if let Some(ssid) = self.ssid {
            network.ssid = ssid;
        }
        if let Some(password) = self.password {
            network.password = password;
        }
        if let Some(channel) = self.channel {
            network.channel = channel;
        }
        if let Some(power) = self.power {
            network.power = power;
        }
    }
}

/// Soft access point used in setup mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPointConfig {
    pub ssid: String,
    pub password: String,
    pub channel: u8,
}

impl Default for AccessPointConfig {
    fn default() -> Self {
        Self {
            ssid: "iris-setup".into(),
            password: "12345678".into(),
            channel: 1,
        }
    }
}

/// Configuration persisted across boots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub device_mode: StreamingMode,
    pub ota: OtaCredentials,
    pub led_external_pwm_duty_cycle: u8,
    pub fan_pwm_duty_cycle: u8,
    pub mdns_hostname: String,
    pub camera: CameraSettings,
    pub networks: Vec<WifiNetworkConfig>,
    pub access_point: AccessPointConfig,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_mode: StreamingMode::default(),
            ota: OtaCredentials::default(),
            led_external_pwm_duty_cycle: 100,
            fan_pwm_duty_cycle: 50,
            mdns_hostname: "iris".into(),
            camera: CameraSettings::default(),
            networks: Vec::new(),
            access_point: AccessPointConfig::default(),
        }
    }
}

/// Section restored by `reset_config`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    All,
    Device,
    Camera,
    Wifi,
    Mdns,
}

impl ConfigSection {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "all" => Some(ConfigSection::All),
            "device" => Some(ConfigSection::Device),
            "camera" => Some(ConfigSection::Camera),
            "wifi" => Some(ConfigSection::Wifi),
            "mdns" => Some(ConfigSection::Mdns),
            _ => None,
        }
    }
}

impl DeviceConfig {
    fn reset(&mut self, section: ConfigSection) {
        let defaults = DeviceConfig::default();
        match section {
            ConfigSection::All => *self = defaults,
            ConfigSection::Device => {
                self.device_mode = defaults.device_mode;
                self.ota = defaults.ota;
                self.led_external_pwm_duty_cycle = defaults.led_external_pwm_duty_cycle;
                self.fan_pwm_duty_cycle = defaults.fan_pwm_duty_cycle;
            }
            ConfigSection::Camera => self.camera = defaults.camera,
            ConfigSection::Wifi => {
                self.networks = defaults.networks;
                self.access_point = defaults.access_point;
            }
            ConfigSection::Mdns => self.mdns_hostname = defaults.mdns_hostname,
        }
    }
}

/// Config store persisted as a JSON file, or held in memory only
pub struct FileConfigStore {
    path: Option<PathBuf>,
    config: RwLock<DeviceConfig>,
}

impl FileConfigStore {
    /// Load the store from `path`, starting from defaults if the file is missing
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = match tokio::fs::read(&path).await {
            Ok(raw) => serde_json::from_slice(&raw)
                .with_context(|| format!("invalid device config in {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No device config at {}, using defaults", path.display());
                DeviceConfig::default()
            }
            Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
        };

        Ok(Self {
            path: Some(path),
            config: RwLock::new(config),
        })
    }

    /// Store that never touches the filesystem
    pub fn in_memory(config: DeviceConfig) -> Self {
        Self {
            path: None,
            config: RwLock::new(config),
        }
    }

    async fn persist(&self, config: &DeviceConfig) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let raw = serde_json::to_vec_pretty(config)?;
        tokio::fs::write(path, raw)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        debug!("Device config written to {}", path.display());
        Ok(())
    }

    /// Apply `f` to a copy, persist it, then make it live
    ///
    /// The write lock is held across the file write so concurrent writers
    /// reach the disk in the order they changed the config. A failed write
    /// leaves the live config untouched.
    async fn modify<T>(&self, f: impl FnOnce(&mut DeviceConfig) -> T) -> Result<T> {
        let mut config = self.config.write().await;
        let mut next = config.clone();
        let out = f(&mut next);
        self.persist(&next).await?;
        *config = next;
        Ok(out)
    }
}

#[async_trait]
impl DeviceConfigStore for FileConfigStore {
    async fn snapshot(&self) -> DeviceConfig {
        self.config.read().await.clone()
    }

    async fn set_device_mode(&self, mode: StreamingMode) -> Result<()> {
        self.modify(|c| c.device_mode = mode).await
    }

    async fn set_ota_credentials(&self, ota: OtaCredentials) -> Result<()> {
        self.modify(|c| c.ota = ota).await
    }

    async fn set_led_duty_cycle(&self, percent: u8) -> Result<()> {
        self.modify(|c| c.led_external_pwm_duty_cycle = percent).await
    }

    async fn set_fan_duty_cycle(&self, percent: u8) -> Result<()> {
        self.modify(|c| c.fan_pwm_duty_cycle = percent).await
    }

    async fn set_mdns_hostname(&self, hostname: String) -> Result<()> {
        self.modify(|c| c.mdns_hostname = hostname).await
    }

    async fn set_camera(&self, camera: CameraSettings) -> Result<()> {
        self.modify(|c| c.camera = camera).await
    }

    async fn set_access_point(&self, ap: AccessPointConfig) -> Result<()> {
        self.modify(|c| c.access_point = ap).await
    }

    async fn upsert_network(&self, network: WifiNetworkConfig) -> Result<()> {
        self.modify(|c| match c.networks.iter_mut().find(|n| n.name == network.name) {
            Some(existing) => *existing = network,
            None => c.networks.push(network),
        })
        .await
    }

    async fn update_network(&self, name: &str, update: NetworkUpdate) -> Result<bool> {
        self.modify(|c| match c.networks.iter_mut().find(|n| n.name == name) {
            Some(network) => {
                update.apply(network);
                true
            }
            None => false,
        })
        .await
    }

    async fn delete_network(&self, name: &str) -> Result<bool> {
        self.modify(|c| {
            let before = c.networks.len();
            c.networks.retain(|n| n.name != name);
            c.networks.len() != before
        })
        .await
    }

    async fn reset(&self, section: ConfigSection) -> Result<()> {
        self.modify(|c| c.reset(section)).await
    }

    async fn save(&self) -> Result<()> {
        let config = self.config.write().await;
        self.persist(&config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn network(name: &str) -> WifiNetworkConfig {
        WifiNetworkConfig {
            name: name.into(),
            ssid: format!("{name}-ssid"),
            bssid: String::new(),
            password: "secret".into(),
            channel: 0,
            power: 0,
        }
    }

    #[test]
    fn test_mode_codes() {
        for mode in [StreamingMode::Setup, StreamingMode::Uvc, StreamingMode::Wifi] {
            assert_eq!(StreamingMode::from_code(mode.code()), Some(mode));
        }
        assert_eq!(StreamingMode::from_code(5), None);
        assert_eq!(StreamingMode::from_name("auto"), Some(StreamingMode::Setup));
        assert_eq!(StreamingMode::from_name("NOT SUPPORTED"), None);
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_name() {
        let store = FileConfigStore::in_memory(DeviceConfig::default());
        store.upsert_network(network("main")).await.unwrap();

        let mut replacement = network("main");
        replacement.ssid = "other".into();
        store.upsert_network(replacement).await.unwrap();

        let config = store.snapshot().await;
        assert_eq!(config.networks.len(), 1);
        assert_eq!(config.networks[0].ssid, "other");
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_network() {
        let store = FileConfigStore::in_memory(DeviceConfig::default());
        assert!(!store.update_network("missing", NetworkUpdate::default()).await.unwrap());
        assert!(!store.delete_network("missing").await.unwrap());

        store.upsert_network(network("main")).await.unwrap();
        let update = NetworkUpdate {
            channel: Some(6),
            ..Default::default()
        };
        assert!(store.update_network("main", update).await.unwrap());
        assert_eq!(store.snapshot().await.networks[0].channel, 6);
        assert!(store.delete_network("main").await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_section_only() {
        let store = FileConfigStore::in_memory(DeviceConfig::default());
        store.set_mdns_hostname("custom".into()).await.unwrap();
        store.set_led_duty_cycle(10).await.unwrap();

        store.reset(ConfigSection::Mdns).await.unwrap();
        let config = store.snapshot().await;
        assert_eq!(config.mdns_hostname, "iris");
        assert_eq!(config.led_external_pwm_duty_cycle, 10);
    }

    #[tokio::test]
    async fn test_file_store_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let store = FileConfigStore::open(&path).await.unwrap();
        store.set_device_mode(StreamingMode::Uvc).await.unwrap();

        let reopened = FileConfigStore::open(&path).await.unwrap();
        assert_eq!(reopened.snapshot().await.device_mode, StreamingMode::Uvc);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_config() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::open(dir.path().join("config.json")).await.unwrap();
        store.set_led_duty_cycle(30).await.unwrap();

        std::fs::remove_dir_all(dir.path()).unwrap();

        assert!(store.set_device_mode(StreamingMode::Uvc).await.is_err());
        assert!(store.set_led_duty_cycle(90).await.is_err());

        let config = store.snapshot().await;
        assert_eq!(config.device_mode, StreamingMode::Setup);
        assert_eq!(config.led_external_pwm_duty_cycle, 30);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_all_reach_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = Arc::new(FileConfigStore::open(&path).await.unwrap());

        let writers: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.upsert_network(network(&format!("net{i}"))).await })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let on_disk = FileConfigStore::open(&path).await.unwrap().snapshot().await;
        assert_eq!(on_disk.networks.len(), 16);
        assert_eq!(on_disk, store.snapshot().await);
    }
}
