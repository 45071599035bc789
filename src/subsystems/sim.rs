//! Host-side simulated hardware
//!
//! Software stand-ins for the board drivers so the command core can run on a
//! development machine. Each simulator counts the writes it receives.

use super::{
    AccessPoint, BatteryStatus, CameraController, CameraSettings, DeviceConfigStore, DutyBand,
    FanController, LedController, MonitoringSource, SystemControl, WifiController, WifiState,
};
use crate::led::LedState;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Notify, RwLock};
use tracing::{debug, info, warn};

/// Queue a status LED state without waiting on the sequencer
fn report_led(tx: Option<&mpsc::Sender<LedState>>, state: LedState) {
    let Some(tx) = tx else {
        return;
    };
    match tx.try_send(state) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => warn!("[LED] request queue full, dropping {:?}", state),
        Err(TrySendError::Closed(_)) => warn!("[LED] status LED channel closed"),
    }
}

/// External LED that records the duty it was driven to
#[derive(Debug, Default)]
pub struct SimLed {
    duty: AtomicU8,
    writes: AtomicUsize,
}

impl SimLed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duty(&self) -> u8 {
        self.duty.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedController for SimLed {
    async fn set_external_duty_cycle(&self, percent: u8) -> Result<()> {
        // 8-bit PWM resolution, as the board driver programs it
        let raw = u32::from(percent) * 255 / 100;
        debug!("[LED] external duty {}% (raw {})", percent, raw);
        self.duty.store(percent, Ordering::SeqCst);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fan limited to a duty band
#[derive(Debug)]
pub struct SimFan {
    band: DutyBand,
    duty: AtomicU8,
    writes: AtomicUsize,
}

impl SimFan {
    pub fn new(band: DutyBand, initial: u8) -> Self {
        Self {
            band,
            duty: AtomicU8::new(band.clamp(initial)),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FanController for SimFan {
    fn duty_band(&self) -> DutyBand {
        self.band
    }

    async fn duty_cycle(&self) -> u8 {
        self.duty.load(Ordering::SeqCst)
    }

    async fn set_duty_cycle(&self, percent: u8) -> Result<()> {
        let clamped = self.band.clamp(percent);
        debug!("[FAN] duty {}%", clamped);
        self.duty.store(clamped, Ordering::SeqCst);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fixed current and battery readings
#[derive(Debug, Clone, Copy)]
pub struct SimMonitoring {
    led_current_ma: Option<f32>,
    battery_mv: f32,
}

impl SimMonitoring {
    /// `battery_mv <= 0` simulates a board without a usable battery reading
    pub fn new(led_current_ma: Option<f32>, battery_mv: f32) -> Self {
        Self {
            led_current_ma,
            battery_mv,
        }
    }
}

#[async_trait]
impl MonitoringSource for SimMonitoring {
    async fn current_milli_amps(&self) -> Option<f32> {
        self.led_current_ma
    }

    async fn battery_status(&self) -> BatteryStatus {
        BatteryStatus::from_millivolts(self.battery_mv)
    }
}

/// Wi-Fi station with a canned scan list
///
/// Connecting succeeds when at least one network is stored in the device
/// config. State changes are mirrored to the status LED when a sender is set.
pub struct SimWifi {
    config: Arc<dyn DeviceConfigStore>,
    access_points: Vec<AccessPoint>,
    scan_latency: Duration,
    state: RwLock<WifiState>,
    led_tx: Option<mpsc::Sender<LedState>>,
    connects: AtomicUsize,
}

impl SimWifi {
    pub fn new(config: Arc<dyn DeviceConfigStore>, access_points: Vec<AccessPoint>) -> Self {
        Self {
            config,
            access_points,
            scan_latency: Duration::ZERO,
            state: RwLock::new(WifiState::Disconnected),
            led_tx: None,
            connects: AtomicUsize::new(0),
        }
    }

    /// Time a scan takes before results are available
    pub fn with_scan_latency(mut self, latency: Duration) -> Self {
        self.scan_latency = latency;
        self
    }

    pub fn with_status_led(mut self, led_tx: mpsc::Sender<LedState>) -> Self {
        self.led_tx = Some(led_tx);
        self
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    async fn set_state(&self, state: WifiState, led: LedState) {
        info!("[WIFI] {}", state.as_str());
        *self.state.write().await = state;
        report_led(self.led_tx.as_ref(), led);
    }

    /// A few plausible neighbours for development runs
    pub fn demo_access_points() -> Vec<AccessPoint> {
        vec![
            AccessPoint {
                ssid: "iris-lab".into(),
                channel: 6,
                rssi: -42,
                mac: [0x24, 0x0a, 0xc4, 0x12, 0x34, 0x56],
                auth_mode: 3,
            },
            AccessPoint {
                ssid: "guest".into(),
                channel: 11,
                rssi: -71,
                mac: [0x9c, 0x53, 0x22, 0xab, 0xcd, 0xef],
                auth_mode: 0,
            },
        ]
    }
}

#[async_trait]
impl WifiController for SimWifi {
    async fn scan_networks(&self, timeout_ms: u64) -> Result<Vec<AccessPoint>> {
        debug!("[WIFI] scanning (timeout {} ms)", timeout_ms);
        tokio::time::sleep(self.scan_latency).await;
        Ok(self.access_points.clone())
    }

    async fn connect(&self) -> Result<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.set_state(WifiState::Connecting, LedState::WifiConnecting).await;

        if self.config.snapshot().await.networks.is_empty() {
            self.set_state(WifiState::Error, LedState::WifiError).await;
        } else {
            let connected = WifiState::Connected {
                ip_address: "192.168.4.2".into(),
            };
            self.set_state(connected, LedState::WifiConnected).await;
        }
        Ok(())
    }

    async fn state(&self) -> WifiState {
        self.state.read().await.clone()
    }
}

/// Image sensor that remembers the last applied settings
#[derive(Debug, Default)]
pub struct SimCamera {
    applied: RwLock<Option<CameraSettings>>,
}

impl SimCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn applied(&self) -> Option<CameraSettings> {
        *self.applied.read().await
    }
}

#[async_trait]
impl CameraController for SimCamera {
    async fn apply(&self, settings: &CameraSettings) -> Result<()> {
        debug!("[CAMERA] apply {:?}", settings);
        *self.applied.write().await = Some(*settings);
        Ok(())
    }
}

/// Board identity plus restart and streaming signals for the host process
pub struct SimSystem {
    mac: [u8; 6],
    board: String,
    version: String,
    restart_requested: AtomicBool,
    restart: Notify,
    streaming: AtomicBool,
    paused: AtomicBool,
    startup_cancelled: AtomicBool,
    led_tx: Option<mpsc::Sender<LedState>>,
}

impl SimSystem {
    pub fn new(mac: [u8; 6], board: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            mac,
            board: board.into(),
            version: version.into(),
            restart_requested: AtomicBool::new(false),
            restart: Notify::new(),
            streaming: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            startup_cancelled: AtomicBool::new(false),
            led_tx: None,
        }
    }

    pub fn with_status_led(mut self, led_tx: mpsc::Sender<LedState>) -> Self {
        self.led_tx = Some(led_tx);
        self
    }

    pub fn restart_requested(&self) -> bool {
        self.restart_requested.load(Ordering::SeqCst)
    }

    /// Resolves once a restart has been carried out
    pub async fn wait_for_restart(&self) {
        let notified = self.restart.notified();
        if self.restart_requested() {
            return;
        }
        notified.await;
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn is_startup_cancelled(&self) -> bool {
        self.startup_cancelled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SystemControl for SimSystem {
    fn mac_address(&self) -> [u8; 6] {
        self.mac
    }

    fn board(&self) -> &str {
        &self.board
    }

    fn version(&self) -> &str {
        &self.version
    }

    async fn restart(&self) {
        warn!("[SYSTEM] restarting");
        self.restart_requested.store(true, Ordering::SeqCst);
        self.restart.notify_waiters();
    }

    async fn start_streaming(&self) -> Result<()> {
        info!("[SYSTEM] streaming activated");
        self.streaming.store(true, Ordering::SeqCst);
        report_led(self.led_tx.as_ref(), LedState::Streaming);
        Ok(())
    }

    async fn set_startup_paused(&self, paused: bool) {
        info!("[SYSTEM] startup countdown {}", if paused { "paused" } else { "resumed" });
        self.paused.store(paused, Ordering::SeqCst);
    }

    async fn notify_command_received(&self) {
        if !self.startup_cancelled.swap(true, Ordering::SeqCst) {
            info!("[SYSTEM] host command received, startup countdown cancelled");
        }
    }
}
