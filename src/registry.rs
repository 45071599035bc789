//! Subsystem registry
//!
//! Typed lookup of the shared subsystem handles the command handlers act on.
//! The registry is assembled once at startup through [`RegistryBuilder`] and
//! is read-only afterwards; a subsystem that was not built in is simply
//! absent, never an error at resolution time.

use crate::subsystems::{
    CameraController, DeviceConfigStore, FanController, LedController, MonitoringSource,
    SystemControl, WifiController,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Identifies one registrable subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubsystemKey {
    DeviceConfig,
    Led,
    Fan,
    Monitoring,
    Wifi,
    Camera,
    System,
}

impl SubsystemKey {
    pub const ALL: [SubsystemKey; 7] = [
        SubsystemKey::DeviceConfig,
        SubsystemKey::Led,
        SubsystemKey::Fan,
        SubsystemKey::Monitoring,
        SubsystemKey::Wifi,
        SubsystemKey::Camera,
        SubsystemKey::System,
    ];

    /// Human-readable name used in failure messages
    pub fn name(&self) -> &'static str {
        match self {
            SubsystemKey::DeviceConfig => "device config",
            SubsystemKey::Led => "LED controller",
            SubsystemKey::Fan => "fan controller",
            SubsystemKey::Monitoring => "monitoring",
            SubsystemKey::Wifi => "Wi-Fi controller",
            SubsystemKey::Camera => "camera",
            SubsystemKey::System => "system control",
        }
    }
}

impl fmt::Display for SubsystemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Write-once set of shared subsystem handles
#[derive(Default, Clone)]
pub struct Registry {
    config: Option<Arc<dyn DeviceConfigStore>>,
    led: Option<Arc<dyn LedController>>,
    fan: Option<Arc<dyn FanController>>,
    monitoring: Option<Arc<dyn MonitoringSource>>,
    wifi: Option<Arc<dyn WifiController>>,
    camera: Option<Arc<dyn CameraController>>,
    system: Option<Arc<dyn SystemControl>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn config(&self) -> Option<&Arc<dyn DeviceConfigStore>> {
        self.config.as_ref()
    }

    pub fn led(&self) -> Option<&Arc<dyn LedController>> {
        self.led.as_ref()
    }

    pub fn fan(&self) -> Option<&Arc<dyn FanController>> {
        self.fan.as_ref()
    }

    pub fn monitoring(&self) -> Option<&Arc<dyn MonitoringSource>> {
        self.monitoring.as_ref()
    }

    pub fn wifi(&self) -> Option<&Arc<dyn WifiController>> {
        self.wifi.as_ref()
    }

    pub fn camera(&self) -> Option<&Arc<dyn CameraController>> {
        self.camera.as_ref()
    }

    pub fn system(&self) -> Option<&Arc<dyn SystemControl>> {
        self.system.as_ref()
    }

    pub fn is_registered(&self, key: SubsystemKey) -> bool {
        match key {
            SubsystemKey::DeviceConfig => self.config.is_some(),
            SubsystemKey::Led => self.led.is_some(),
            SubsystemKey::Fan => self.fan.is_some(),
            SubsystemKey::Monitoring => self.monitoring.is_some(),
            SubsystemKey::Wifi => self.wifi.is_some(),
            SubsystemKey::Camera => self.camera.is_some(),
            SubsystemKey::System => self.system.is_some(),
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registered: Vec<_> = SubsystemKey::ALL
            .into_iter()
            .filter(|key| self.is_registered(*key))
            .collect();
        f.debug_struct("Registry").field("registered", &registered).finish()
    }
}

/// Startup-time assembly of a [`Registry`]
///
/// Registering a key twice is a wiring bug: it panics in debug builds and the
/// later handle wins in release builds.
#[derive(Default)]
pub struct RegistryBuilder {
    registry: Registry,
}

fn register<T: ?Sized>(slot: &mut Option<Arc<T>>, key: SubsystemKey, handle: Arc<T>) {
    debug_assert!(slot.is_none(), "{key} registered twice");
    if slot.is_some() {
        warn!("[REGISTRY] {} registered twice, replacing", key);
    }
    debug!("[REGISTRY] {} registered", key);
    *slot = Some(handle);
}

impl RegistryBuilder {
    pub fn with_config(mut self, handle: Arc<dyn DeviceConfigStore>) -> Self {
        register(&mut self.registry.config, SubsystemKey::DeviceConfig, handle);
        self
    }

    pub fn with_led(mut self, handle: Arc<dyn LedController>) -> Self {
        register(&mut self.registry.led, SubsystemKey::Led, handle);
        self
    }

    pub fn with_fan(mut self, handle: Arc<dyn FanController>) -> Self {
        register(&mut self.registry.fan, SubsystemKey::Fan, handle);
        self
    }

    pub fn with_monitoring(mut self, handle: Arc<dyn MonitoringSource>) -> Self {
        register(&mut self.registry.monitoring, SubsystemKey::Monitoring, handle);
        self
    }

    pub fn with_wifi(mut self, handle: Arc<dyn WifiController>) -> Self {
        register(&mut self.registry.wifi, SubsystemKey::Wifi, handle);
        self
    }

    pub fn with_camera(mut self, handle: Arc<dyn CameraController>) -> Self {
        register(&mut self.registry.camera, SubsystemKey::Camera, handle);
        self
    }

    pub fn with_system(mut self, handle: Arc<dyn SystemControl>) -> Self {
        register(&mut self.registry.system, SubsystemKey::System, handle);
        self
    }

    pub fn build(self) -> Registry {
        self.registry
    }
}
