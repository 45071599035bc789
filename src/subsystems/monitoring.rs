//! Battery state-of-charge estimation

/// Li-ion open-circuit voltage (mV) to state-of-charge (%) table, descending
const SOC_TABLE: [(f32, f32); 12] = [
    (4200.0, 100.0),
    (4060.0, 90.0),
    (3980.0, 80.0),
    (3920.0, 70.0),
    (3870.0, 60.0),
    (3820.0, 50.0),
    (3790.0, 40.0),
    (3770.0, 30.0),
    (3740.0, 20.0),
    (3680.0, 10.0),
    (3450.0, 5.0),
    (3300.0, 0.0),
];

/// One battery sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryStatus {
    pub voltage_mv: f32,
    pub percent: f32,
    /// False when no usable sample was taken
    pub valid: bool,
}

impl BatteryStatus {
    pub const UNAVAILABLE: BatteryStatus = BatteryStatus {
        voltage_mv: 0.0,
        percent: 0.0,
        valid: false,
    };

    /// Status for a measured pack voltage; non-positive readings are invalid
    pub fn from_millivolts(voltage_mv: f32) -> Self {
        if voltage_mv <= 0.0 {
            return Self::UNAVAILABLE;
        }
        Self {
            voltage_mv,
            percent: state_of_charge(voltage_mv),
            valid: true,
        }
    }
}

/// Linear interpolation over [`SOC_TABLE`], clamped to 0..=100
pub fn state_of_charge(voltage_mv: f32) -> f32 {
    let (top_mv, top_soc) = SOC_TABLE[0];
    let (bottom_mv, bottom_soc) = SOC_TABLE[SOC_TABLE.len() - 1];

    if voltage_mv >= top_mv {
        return top_soc;
    }
    if voltage_mv <= bottom_mv {
        return bottom_soc;
    }

    let percent = SOC_TABLE
        .windows(2)
        .find(|pair| voltage_mv <= pair[0].0 && voltage_mv >= pair[1].0)
        .map(|pair| {
            let (high_mv, high_soc) = pair[0];
            let (low_mv, low_soc) = pair[1];
            let span = high_mv - low_mv;
            let ratio = (voltage_mv - low_mv) / if span > 0.0 { span } else { 1.0 };
            low_soc + ratio * (high_soc - low_soc)
        })
        .unwrap_or(bottom_soc);

    percent.clamp(0.0, 100.0)
}
