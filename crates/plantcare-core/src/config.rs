//! Tunable parameters for sampling cadence, statistics and alarms
//!
//! Nothing in the evaluation logic hard-codes a threshold; everything is read
//! from a [`PlantcareConfig`]. Configs can be exchanged as `postcard` blobs so
//! a tuned profile can be pushed to the device without rebuilding.

use alloc::vec::Vec;

use log::error;
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

/// Milliseconds in one statistics window ("hour")
pub const WINDOW_SPAN_MS: u32 = 3_600_000;

pub const DEFAULT_TEST_PERIOD_MS: u32 = 2_000;
pub const DEFAULT_NORMAL_PERIOD_MS: u32 = 30_000;
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 50;
pub const DEFAULT_NOT_READY_BACKOFF_MS: u32 = 100;
pub const DEFAULT_GPS_MAX_BYTES_PER_CYCLE: u16 = 200;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Sampling and polling periods must be non-zero")]
    InvalidPeriod,
    #[error("Statistics window must hold at least one sample")]
    InvalidWindow,
    #[error("Alarm bounds for {channel} have min above max")]
    InvalidBounds { channel: &'static str },
    #[error("Raw range for {channel} is empty or inverted")]
    InvalidRange { channel: &'static str },
    #[error("Config blob could not be decoded")]
    Decode,
    #[error("Config could not be encoded")]
    Encode,
}

/// Inclusive acceptable range for one channel
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: i32,
    pub max: i32,
}

impl Bounds {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub const fn contains(self, value: i32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Raw ADC counts mapped to 0 % and 100 %
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRange {
    pub min_raw: i32,
    pub max_raw: i32,
}

impl RawRange {
    pub const fn new(min_raw: i32, max_raw: i32) -> Self {
        Self { min_raw, max_raw }
    }
}

/// Alarm limits, in the same units the evaluator receives
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmThresholds {
    /// °C × 100
    pub temperature_x100: Bounds,
    /// %RH × 100
    pub humidity_x100: Bounds,
    /// % × 10
    pub light_pct_x10: Bounds,
    /// % × 10
    pub soil_pct_x10: Bounds,
    /// Largest tolerated |acceleration| on any axis, g × 100
    pub accel_limit_g100: i32,
}

impl AlarmThresholds {
    pub const fn new() -> Self {
        Self {
            temperature_x100: Bounds::new(1_500, 3_000),
            humidity_x100: Bounds::new(3_000, 7_000),
            light_pct_x10: Bounds::new(100, 900),
            soil_pct_x10: Bounds::new(200, 800),
            accel_limit_g100: 150,
        }
    }
}

impl Default for AlarmThresholds {
    fn default() -> Self {
        Self::new()
    }
}

/// Complete runtime configuration
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlantcareConfig {
    /// Sampling period in TEST mode
    pub test_period_ms: u32,
    /// Sampling period in NORMAL mode
    pub normal_period_ms: u32,
    /// Samples per statistics window
    pub window_size_samples: u32,
    /// Controller polling interval
    pub poll_interval_ms: u32,
    /// Producer back-off while sensors are not ready
    pub not_ready_backoff_ms: u32,
    /// GPS bytes drained per acquisition cycle
    pub gps_max_bytes_per_cycle: u16,
    pub thresholds: AlarmThresholds,
    pub light_range: RawRange,
    pub soil_range: RawRange,
}

impl PlantcareConfig {
    pub const fn new() -> Self {
        Self {
            test_period_ms: DEFAULT_TEST_PERIOD_MS,
            normal_period_ms: DEFAULT_NORMAL_PERIOD_MS,
            window_size_samples: WINDOW_SPAN_MS / DEFAULT_NORMAL_PERIOD_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            not_ready_backoff_ms: DEFAULT_NOT_READY_BACKOFF_MS,
            gps_max_bytes_per_cycle: DEFAULT_GPS_MAX_BYTES_PER_CYCLE,
            thresholds: AlarmThresholds::new(),
            light_range: RawRange::new(0, 400),
            soil_range: RawRange::new(0, 4095),
        }
    }

    /// Change the NORMAL period and resize the window so it still spans an hour.
    pub const fn with_normal_period_ms(mut self, normal_period_ms: u32) -> Self {
        self.normal_period_ms = normal_period_ms;
        self.window_size_samples = if normal_period_ms == 0 {
            0
        } else {
            WINDOW_SPAN_MS / normal_period_ms
        };
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.test_period_ms == 0 || self.normal_period_ms == 0 || self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidPeriod);
        }
        if self.window_size_samples == 0 {
            return Err(ConfigError::InvalidWindow);
        }

        let t = &self.thresholds;
        for (channel, bounds) in [
            ("temperature", t.temperature_x100),
            ("humidity", t.humidity_x100),
            ("light", t.light_pct_x10),
            ("soil", t.soil_pct_x10),
        ] {
            if bounds.min > bounds.max {
                return Err(ConfigError::InvalidBounds { channel });
            }
        }
        if t.accel_limit_g100 < 0 {
            return Err(ConfigError::InvalidBounds {
                channel: "acceleration",
            });
        }

        for (channel, range) in [("light", self.light_range), ("soil", self.soil_range)] {
            if range.max_raw <= range.min_raw {
                return Err(ConfigError::InvalidRange { channel });
            }
        }

        Ok(())
    }

    /// Decode and validate a config blob.
    pub fn from_postcard(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|e| {
            error!("Config decode failed: {:?}", e);
            ConfigError::Decode
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_postcard(&self) -> Result<Vec<u8>, ConfigError> {
        postcard::to_allocvec(self).map_err(|e| {
            error!("Config encode failed: {:?}", e);
            ConfigError::Encode
        })
    }
}

impl Default for PlantcareConfig {
    fn default() -> Self {
        Self::new()
    }
}
