//! Operation catalog
//!
//! Per-operation payload schemas. The catalog is pure data: it is consulted
//! before any handler runs and never touches device state.

use crate::operation::OperationId;
use crate::payload::Payload;
use serde_json::Value;
use thiserror::Error;

/// Primitive type a payload field must have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    String,
    Boolean,
}

impl FieldType {
    fn matches(&self, value: &Value) -> bool {
        match self {
            // JSON integers above i64::MAX are not representable on the device
            FieldType::Integer => value.is_i64(),
            FieldType::String => value.is_string(),
            FieldType::Boolean => value.is_boolean(),
        }
    }
}

/// One accepted payload field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
    /// Inclusive bounds for integer fields
    pub range: Option<(i64, i64)>,
}

impl FieldSpec {
    const fn required(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: true,
            range: None,
        }
    }

    const fn optional(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: false,
            range: None,
        }
    }

    const fn within(mut self, min: i64, max: i64) -> Self {
        self.range = Some((min, max));
        self
    }

    /// Check a single field of `payload` against this spec
    pub fn check(&self, payload: &Payload) -> Result<(), ValidationError> {
        let value = match payload.get(self.name) {
            Some(value) => value,
            None if self.required => return Err(ValidationError::Invalid(self.name)),
            None => return Ok(()),
        };

        if !self.ty.matches(value) {
            return Err(ValidationError::Invalid(self.name));
        }

        if let Some((min, max)) = self.range {
            let in_range = value.as_i64().is_some_and(|v| (min..=max).contains(&v));
            if !in_range {
                return Err(ValidationError::OutOfRange(self.name));
            }
        }

        Ok(())
    }
}

/// Schema violation detected before a handler runs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} missing or invalid")]
    Invalid(&'static str),

    #[error("{0} out of range")]
    OutOfRange(&'static str),
}

use FieldType::{Boolean, Integer, String as Str};

const NO_FIELDS: &[FieldSpec] = &[];

const PAUSE: &[FieldSpec] = &[FieldSpec::required("pause", Boolean)];

const SET_WIFI: &[FieldSpec] = &[
    FieldSpec::required("name", Str),
    FieldSpec::required("ssid", Str),
    FieldSpec::optional("password", Str),
    FieldSpec::optional("bssid", Str),
    FieldSpec::optional("channel", Integer).within(0, 14),
    FieldSpec::optional("power", Integer),
];

const UPDATE_WIFI: &[FieldSpec] = &[
    FieldSpec::required("name", Str),
    FieldSpec::optional("ssid", Str),
    FieldSpec::optional("password", Str),
    FieldSpec::optional("channel", Integer).within(0, 14),
    FieldSpec::optional("power", Integer),
];

const UPDATE_AP_WIFI: &[FieldSpec] = &[
    FieldSpec::optional("ssid", Str),
    FieldSpec::optional("password", Str),
    FieldSpec::optional("channel", Integer).within(0, 14),
];

const DELETE_NETWORK: &[FieldSpec] = &[FieldSpec::required("name", Str)];

const SCAN_NETWORKS: &[FieldSpec] = &[FieldSpec::optional("timeout_ms", Integer).within(1, 60_000)];

const SET_MDNS: &[FieldSpec] = &[FieldSpec::required("hostname", Str)];

const UPDATE_CAMERA: &[FieldSpec] = &[
    FieldSpec::optional("vflip", Integer).within(0, 1),
    FieldSpec::optional("hflip", Integer).within(0, 1),
    FieldSpec::optional("framesize", Integer).within(0, 20),
    FieldSpec::optional("quality", Integer).within(0, 63),
    FieldSpec::optional("brightness", Integer).within(-2, 2),
];

const RESET_CONFIG: &[FieldSpec] = &[FieldSpec::required("section", Str)];

const SET_DEVICE_MODE: &[FieldSpec] = &[FieldSpec::required("mode", Integer)];

const SWITCH_MODE: &[FieldSpec] = &[FieldSpec::required("mode", Str)];

const UPDATE_OTA_CREDENTIALS: &[FieldSpec] = &[
    FieldSpec::optional("login", Str),
    FieldSpec::optional("password", Str),
    FieldSpec::optional("port", Integer),
];

const DUTY_CYCLE: &[FieldSpec] = &[FieldSpec::required("dutyCycle", Integer).within(0, 100)];

/// Accepted fields for `op`, in declaration order
pub fn field_specs(op: OperationId) -> &'static [FieldSpec] {
    match op {
        OperationId::Pause => PAUSE,
        OperationId::SetWifi => SET_WIFI,
        OperationId::UpdateWifi => UPDATE_WIFI,
        OperationId::UpdateApWifi => UPDATE_AP_WIFI,
        OperationId::DeleteNetwork => DELETE_NETWORK,
        OperationId::ScanNetworks => SCAN_NETWORKS,
        OperationId::SetMdns => SET_MDNS,
        OperationId::UpdateCamera => UPDATE_CAMERA,
        OperationId::ResetConfig => RESET_CONFIG,
        OperationId::SetDeviceMode => SET_DEVICE_MODE,
        OperationId::SwitchMode => SWITCH_MODE,
        OperationId::UpdateOtaCredentials => UPDATE_OTA_CREDENTIALS,
        OperationId::SetLedDutyCycle | OperationId::SetFanDutyCycle => DUTY_CYCLE,
        OperationId::Ping
        | OperationId::ConnectWifi
        | OperationId::GetWifiStatus
        | OperationId::GetMdnsName
        | OperationId::SaveConfig
        | OperationId::GetConfig
        | OperationId::RestartDevice
        | OperationId::StartStreaming
        | OperationId::GetDeviceMode
        | OperationId::GetLedDutyCycle
        | OperationId::GetFanDutyCycle
        | OperationId::GetSerial
        | OperationId::GetLedCurrent
        | OperationId::GetBatteryStatus
        | OperationId::GetWhoAmI => NO_FIELDS,
    }
}

/// Validate `payload` against the schema of `op`
///
/// Fields are checked in declaration order and the first violation is
/// reported. Fields not named by the schema are ignored.
pub fn validate(op: OperationId, payload: &Payload) -> Result<(), ValidationError> {
    field_specs(op).iter().try_for_each(|spec| spec.check(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload;

    fn payload(raw: &str) -> Payload {
        payload::parse(raw.as_bytes()).unwrap()
    }

    #[test]
    fn test_no_field_operations_accept_empty_payload() {
        for op in OperationId::ALL {
            if field_specs(op).iter().all(|spec| !spec.required) {
                assert_eq!(validate(op, &Payload::new()), Ok(()), "{op}");
            }
        }
    }

    #[test]
    fn test_missing_required_field() {
        let err = validate(OperationId::SetMdns, &payload(r#"{"name": "awd"}"#)).unwrap_err();
        assert_eq!(err, ValidationError::Invalid("hostname"));
        assert_eq!(err.to_string(), "hostname missing or invalid");
    }

    #[test]
    fn test_duty_cycle_rejections() {
        let cases = [
            (r#"{}"#, ValidationError::Invalid("dutyCycle")),
            (r#"{"dutyCycle": 1.5}"#, ValidationError::Invalid("dutyCycle")),
            (r#"{"dutyCycle": "21"}"#, ValidationError::Invalid("dutyCycle")),
            (r#"{"dutyCycle": null}"#, ValidationError::Invalid("dutyCycle")),
            (r#"{"dutyCycle": -1}"#, ValidationError::OutOfRange("dutyCycle")),
            (r#"{"dutyCycle": 150}"#, ValidationError::OutOfRange("dutyCycle")),
        ];

        for (raw, expected) in cases {
            assert_eq!(validate(OperationId::SetLedDutyCycle, &payload(raw)), Err(expected), "{raw}");
        }
        assert_eq!(validate(OperationId::SetLedDutyCycle, &payload(r#"{"dutyCycle": 100}"#)), Ok(()));
    }

    #[test]
    fn test_optional_field_type_is_still_checked() {
        let err = validate(OperationId::ScanNetworks, &payload(r#"{"timeout_ms": "soon"}"#)).unwrap_err();
        assert_eq!(err, ValidationError::Invalid("timeout_ms"));
        assert_eq!(validate(OperationId::ScanNetworks, &payload(r#"{"timeout_ms": 500}"#)), Ok(()));
    }

    #[test]
    fn test_first_violation_wins() {
        let err = validate(OperationId::SetWifi, &payload(r#"{"channel": 99}"#)).unwrap_err();
        assert_eq!(err, ValidationError::Invalid("name"));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let raw = r#"{"mode": 1, "extra": [1, 2, 3]}"#;
        assert_eq!(validate(OperationId::SetDeviceMode, &payload(raw)), Ok(()));
    }

    #[test]
    fn test_integer_above_i64_is_invalid() {
        let raw = r#"{"dutyCycle": 18446744073709551615}"#;
        assert_eq!(
            validate(OperationId::SetFanDutyCycle, &payload(raw)),
            Err(ValidationError::Invalid("dutyCycle"))
        );

        // fields without a range must not let it through either
        let raw = r#"{"mode": 18446744073709551615}"#;
        let err = validate(OperationId::SetDeviceMode, &payload(raw)).unwrap_err();
        assert_eq!(err.to_string(), "mode missing or invalid");

        let raw = r#"{"name": "home", "ssid": "home", "power": 9223372036854775808}"#;
        assert_eq!(validate(OperationId::SetWifi, &payload(raw)), Err(ValidationError::Invalid("power")));

        let raw = r#"{"mode": 9223372036854775807}"#;
        assert_eq!(validate(OperationId::SetDeviceMode, &payload(raw)), Ok(()));
    }
}
