//! Operation identifiers
//!
//! The closed set of commands a device understands. Wire names are the
//! snake_case strings returned by [`OperationId::as_str`].

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a wire name does not match any operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown command: {0}")]
pub struct UnknownOperation(pub String);

/// Every command supported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationId {
    Ping,
    Pause,
    SetWifi,
    UpdateWifi,
    UpdateApWifi,
    DeleteNetwork,
    ConnectWifi,
    GetWifiStatus,
    ScanNetworks,
    SetMdns,
    GetMdnsName,
    UpdateCamera,
    SaveConfig,
    GetConfig,
    ResetConfig,
    RestartDevice,
    StartStreaming,
    SetDeviceMode,
    SwitchMode,
    GetDeviceMode,
    UpdateOtaCredentials,
    SetLedDutyCycle,
    GetLedDutyCycle,
    SetFanDutyCycle,
    GetFanDutyCycle,
    GetSerial,
    GetLedCurrent,
    GetBatteryStatus,
    GetWhoAmI,
}

impl OperationId {
    /// All operations, in declaration order
    pub const ALL: [OperationId; 29] = [
        Self::Ping,
        Self::Pause,
        Self::SetWifi,
        Self::UpdateWifi,
        Self::UpdateApWifi,
        Self::DeleteNetwork,
        Self::ConnectWifi,
        Self::GetWifiStatus,
        Self::ScanNetworks,
        Self::SetMdns,
        Self::GetMdnsName,
        Self::UpdateCamera,
        Self::SaveConfig,
        Self::GetConfig,
        Self::ResetConfig,
        Self::RestartDevice,
        Self::StartStreaming,
        Self::SetDeviceMode,
        Self::SwitchMode,
        Self::GetDeviceMode,
        Self::UpdateOtaCredentials,
        Self::SetLedDutyCycle,
        Self::GetLedDutyCycle,
        Self::SetFanDutyCycle,
        Self::GetFanDutyCycle,
        Self::GetSerial,
        Self::GetLedCurrent,
        Self::GetBatteryStatus,
        Self::GetWhoAmI,
    ];

    /// Wire name of this operation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Pause => "pause",
            Self::SetWifi => "set_wifi",
            Self::UpdateWifi => "update_wifi",
            Self::UpdateApWifi => "update_ap_wifi",
            Self::DeleteNetwork => "delete_network",
            Self::ConnectWifi => "connect_wifi",
            Self::GetWifiStatus => "get_wifi_status",
            Self::ScanNetworks => "scan_networks",
            Self::SetMdns => "set_mdns",
            Self::GetMdnsName => "get_mdns_name",
            Self::UpdateCamera => "update_camera",
            Self::SaveConfig => "save_config",
            Self::GetConfig => "get_config",
            Self::ResetConfig => "reset_config",
            Self::RestartDevice => "restart_device",
            Self::StartStreaming => "start_streaming",
            Self::SetDeviceMode => "set_device_mode",
            Self::SwitchMode => "switch_mode",
            Self::GetDeviceMode => "get_device_mode",
            Self::UpdateOtaCredentials => "update_ota_credentials",
            Self::SetLedDutyCycle => "set_led_duty_cycle",
            Self::GetLedDutyCycle => "get_led_duty_cycle",
            Self::SetFanDutyCycle => "set_fan_duty_cycle",
            Self::GetFanDutyCycle => "get_fan_duty_cycle",
            Self::GetSerial => "get_serial",
            Self::GetLedCurrent => "get_led_current",
            Self::GetBatteryStatus => "get_battery_status",
            Self::GetWhoAmI => "get_who_am_i",
        }
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationId {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| UnknownOperation(s.to_string()))
    }
}
