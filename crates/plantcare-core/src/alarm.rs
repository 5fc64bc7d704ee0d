//! Alarm evaluation for out-of-range readings
//!
//! Each condition is an independent threshold predicate. When several are
//! violated at once, the first entry of [`PRIORITY`] wins, and the indicator
//! shows that condition's color code.

use serde::Serialize;

use crate::config::AlarmThresholds;
use crate::sample::{DominantColor, SensorSample};
use crate::units::ConvertedValues;

/// On/off state of the three indicator LED channels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RgbState {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
}

impl RgbState {
    pub const OFF: Self = Self::new(false, false, false);

    pub const fn new(red: bool, green: bool, blue: bool) -> Self {
        Self { red, green, blue }
    }
}

/// A threshold condition the evaluator checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlarmCondition {
    Temperature,
    Humidity,
    Light,
    Soil,
    Acceleration,
    /// The color sensor does not see the healthy reference color (green)
    Color,
}

/// Resolution order, highest priority first
pub const PRIORITY: [AlarmCondition; 6] = [
    AlarmCondition::Temperature,
    AlarmCondition::Humidity,
    AlarmCondition::Light,
    AlarmCondition::Soil,
    AlarmCondition::Acceleration,
    AlarmCondition::Color,
];

impl AlarmCondition {
    /// Whether this condition is violated by the given readings
    pub fn is_violated(
        self,
        values: &ConvertedValues,
        sample: &SensorSample,
        thresholds: &AlarmThresholds,
    ) -> bool {
        match self {
            Self::Temperature => !thresholds.temperature_x100.contains(values.temperature_x100),
            Self::Humidity => !thresholds.humidity_x100.contains(values.humidity_x100),
            Self::Light => !thresholds.light_pct_x10.contains(values.light_pct_x10),
            Self::Soil => !thresholds.soil_pct_x10.contains(values.soil_pct_x10),
            Self::Acceleration => {
                let limit = i64::from(thresholds.accel_limit_g100);
                [sample.accel_x_g100, sample.accel_y_g100, sample.accel_z_g100]
                    .into_iter()
                    .any(|axis| i64::from(axis).abs() > limit)
            }
            Self::Color => sample.dominant_color != DominantColor::Green,
        }
    }

    /// The indicator color that represents this condition
    pub const fn color(self) -> AlarmColor {
        match self {
            Self::Temperature => AlarmColor::Red,
            Self::Humidity => AlarmColor::Blue,
            Self::Light => AlarmColor::Green,
            Self::Soil => AlarmColor::Yellow,
            Self::Acceleration => AlarmColor::Cyan,
            Self::Color => AlarmColor::Magenta,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Light => "light",
            Self::Soil => "soil",
            Self::Acceleration => "acceleration",
            Self::Color => "color",
        }
    }
}

/// Categorical indicator output; the channel mix carries no meaning beyond
/// identifying the winning condition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum AlarmColor {
    #[default]
    Off,
    Red,
    Green,
    Blue,
    /// Red + Green
    Yellow,
    /// Green + Blue
    Cyan,
    /// Red + Blue
    Magenta,
}

impl AlarmColor {
    pub const fn rgb(self) -> RgbState {
        match self {
            Self::Off => RgbState::OFF,
            Self::Red => RgbState::new(true, false, false),
            Self::Green => RgbState::new(false, true, false),
            Self::Blue => RgbState::new(false, false, true),
            Self::Yellow => RgbState::new(true, true, false),
            Self::Cyan => RgbState::new(false, true, true),
            Self::Magenta => RgbState::new(true, false, true),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::Cyan => "cyan",
            Self::Magenta => "magenta",
        }
    }
}

/// The highest-priority violated condition, if any
pub fn first_violation(
    values: &ConvertedValues,
    sample: &SensorSample,
    thresholds: &AlarmThresholds,
) -> Option<AlarmCondition> {
    PRIORITY
        .into_iter()
        .find(|condition| condition.is_violated(values, sample, thresholds))
}

/// Resolve one sample to a single indicator color.
pub fn evaluate(
    values: &ConvertedValues,
    sample: &SensorSample,
    thresholds: &AlarmThresholds,
) -> AlarmColor {
    first_violation(values, sample, thresholds).map_or(AlarmColor::Off, AlarmCondition::color)
}
