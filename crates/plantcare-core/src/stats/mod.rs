//! Windowed statistics over accepted samples
//!
//! The [`StatsAggregator`] folds each NORMAL-mode sample into running
//! sum/min/max accumulators and dominant-color votes. Once a window worth of
//! samples is in, it yields a [`WindowSummary`] and starts over.

pub mod accumulator;

pub use accumulator::StatsAggregator;

use core::fmt::Display;

use serde::Serialize;

use crate::sample::DominantColor;

/// Number of channels tracked per window
pub const STAT_CHANNELS: usize = 7;

/// Channels aggregated by the statistics window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatChannel {
    /// °C × 100
    Temperature,
    /// %RH × 100
    Humidity,
    /// % × 10
    Light,
    /// % × 10
    Soil,
    /// (m/s²) × 100
    AccelX,
    AccelY,
    AccelZ,
}

impl StatChannel {
    pub const ALL: [Self; STAT_CHANNELS] = [
        Self::Temperature,
        Self::Humidity,
        Self::Light,
        Self::Soil,
        Self::AccelX,
        Self::AccelY,
        Self::AccelZ,
    ];

    /// Index of this channel in per-channel arrays
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Light => "light",
            Self::Soil => "soil",
            Self::AccelX => "accel_x",
            Self::AccelY => "accel_y",
            Self::AccelZ => "accel_z",
        }
    }

    /// Fixed-point divisor to render values of this channel
    const fn scale(self) -> f32 {
        match self {
            Self::Light | Self::Soil => 10.0,
            _ => 100.0,
        }
    }
}

/// Mean, minimum and maximum of one channel over a window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChannelSummary {
    /// Sum divided by count, truncated toward zero
    pub mean: i32,
    pub min: i32,
    pub max: i32,
}

/// Result of one completed statistics window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowSummary {
    pub channels: [ChannelSummary; STAT_CHANNELS],
    /// Color that was dominant most often, `Unknown` if no votes were cast
    pub dominant_color: DominantColor,
    pub sample_count: u32,
}

impl WindowSummary {
    pub const fn channel(&self, channel: StatChannel) -> ChannelSummary {
        self.channels[channel.index()]
    }
}

impl Display for WindowSummary {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[WindowSummary] samples: {}", self.sample_count)?;
        for channel in StatChannel::ALL {
            let summary = self.channel(channel);
            let scale = channel.scale();
            write!(
                f,
                ", {}: {:.2}/{:.2}/{:.2}",
                channel.label(),
                summary.mean as f32 / scale,
                summary.min as f32 / scale,
                summary.max as f32 / scale,
            )?;
        }
        write!(f, ", dominant: {}", self.dominant_color.label())
    }
}
