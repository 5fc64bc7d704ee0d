//! Raw sensor units to fixed-point physical units
//!
//! - Percentages are returned × 10 (`1000` is 100.0 %)
//! - Accelerations are returned in (m/s²) × 100

use crate::config::{PlantcareConfig, RawRange};
use crate::sample::SensorSample;

/// Map `raw` linearly from `range` onto 0..=1000 (percent × 10).
///
/// Values outside the range are clamped first. A misconfigured range with
/// `max_raw <= min_raw` yields `0` instead of dividing by zero.
pub fn pct_x10_from_range(raw: i32, range: RawRange) -> i32 {
    let den = i64::from(range.max_raw) - i64::from(range.min_raw);
    if den <= 0 {
        return 0;
    }

    let raw = raw.clamp(range.min_raw, range.max_raw);
    let num = i64::from(raw) - i64::from(range.min_raw);

    (num * 1000 / den) as i32
}

/// Ambient light as percent × 10, higher raw reading means more light
pub fn light_raw_to_pct_x10(raw: i32, range: RawRange) -> i32 {
    pct_x10_from_range(raw, range)
}

/// Soil moisture as percent × 10.
///
/// Sensors that read lower when wetter are handled by swapping the configured
/// range rather than here.
pub fn soil_raw_to_pct_x10(raw: i32, range: RawRange) -> i32 {
    pct_x10_from_range(raw, range)
}

/// g × 100 to (m/s²) × 100, using 1 g = 9.81 m/s²
///
/// Saturates at the `i32` bounds instead of wrapping.
pub const fn accel_g100_to_ms2_x100(g100: i32) -> i32 {
    let ms2_x100 = (g100 as i64 * 981) / 100;
    if ms2_x100 > i32::MAX as i64 {
        i32::MAX
    } else if ms2_x100 < i32::MIN as i64 {
        i32::MIN
    } else {
        ms2_x100 as i32
    }
}

/// One sample's readings in the units the evaluator and statistics consume
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertedValues {
    /// °C × 100
    pub temperature_x100: i32,
    /// %RH × 100
    pub humidity_x100: i32,
    /// % × 10
    pub light_pct_x10: i32,
    /// % × 10
    pub soil_pct_x10: i32,
    /// (m/s²) × 100 per axis, x/y/z
    pub accel_ms2_x100: [i32; 3],
}

impl ConvertedValues {
    pub fn from_sample(sample: &SensorSample, config: &PlantcareConfig) -> Self {
        Self {
            temperature_x100: sample.temperature_x100,
            humidity_x100: sample.humidity_x100,
            light_pct_x10: light_raw_to_pct_x10(i32::from(sample.light_raw), config.light_range),
            soil_pct_x10: soil_raw_to_pct_x10(i32::from(sample.soil_raw), config.soil_range),
            accel_ms2_x100: [
                accel_g100_to_ms2_x100(sample.accel_x_g100),
                accel_g100_to_ms2_x100(sample.accel_y_g100),
                accel_g100_to_ms2_x100(sample.accel_z_g100),
            ],
        }
    }
}
