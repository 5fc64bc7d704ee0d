//! Typed readings produced by each sensor collaborator

use super::SensorReadings;
use crate::sample::{DominantColor, SensorSample};

/// Soil moisture sensor (ADC)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoilReadings {
    pub raw: i16,
    pub millivolts: i32,
}

impl SensorReadings for SoilReadings {
    fn apply(self, sample: &mut SensorSample) {
        sample.soil_raw = self.raw;
        sample.soil_mv = self.millivolts;
    }
}

/// Ambient light sensor (ADC)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightReadings {
    pub raw: i16,
    pub millivolts: i32,
}

impl SensorReadings for LightReadings {
    fn apply(self, sample: &mut SensorSample) {
        sample.light_raw = self.raw;
        sample.light_mv = self.millivolts;
    }
}

/// Combined temperature / relative humidity sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClimateReadings {
    /// °C × 100
    pub temperature_x100: i32,
    /// %RH × 100
    pub humidity_x100: i32,
}

impl SensorReadings for ClimateReadings {
    fn apply(self, sample: &mut SensorSample) {
        sample.temperature_x100 = self.temperature_x100;
        sample.humidity_x100 = self.humidity_x100;
    }
}

/// 3-axis accelerometer, g × 100 per axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccelReadings {
    pub x_g100: i32,
    pub y_g100: i32,
    pub z_g100: i32,
}

impl SensorReadings for AccelReadings {
    fn apply(self, sample: &mut SensorSample) {
        sample.accel_x_g100 = self.x_g100;
        sample.accel_y_g100 = self.y_g100;
        sample.accel_z_g100 = self.z_g100;
    }
}

/// Color sensor channel counts.
///
/// The dominant color is classified here, on the raw red/green/blue counts,
/// so it always matches the counts stored alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorReadings {
    pub clear: u16,
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

impl SensorReadings for ColorReadings {
    fn apply(self, sample: &mut SensorSample) {
        sample.color_clear = self.clear;
        sample.color_red = self.red;
        sample.color_green = self.green;
        sample.color_blue = self.blue;
        sample.dominant_color = DominantColor::classify(
            u32::from(self.red),
            u32::from(self.green),
            u32::from(self.blue),
        );
    }
}
