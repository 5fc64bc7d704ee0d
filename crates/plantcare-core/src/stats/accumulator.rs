use log::debug;

use super::{ChannelSummary, STAT_CHANNELS, StatChannel, WindowSummary};
use crate::sample::{DominantColor, SensorSample};
use crate::units::ConvertedValues;

/// Running sum/min/max for one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChannelAccumulator {
    /// i64 so a full window of i32 readings cannot overflow
    sum: i64,
    min: i32,
    max: i32,
}

impl ChannelAccumulator {
    const EMPTY: Self = Self {
        sum: 0,
        min: i32::MAX,
        max: i32::MIN,
    };

    fn add(&mut self, value: i32) {
        self.sum = self.sum.saturating_add(i64::from(value));
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }
}

/// In-memory accumulator for one statistics window
///
/// ## Lifecycle
///
/// - Reset on NORMAL-mode entry and after every emitted summary
/// - [`accumulate`](Self::accumulate) once per accepted sample
/// - [`summarize`](Self::summarize) when [`is_full`](Self::is_full), then reset
///
/// ```rust,ignore
/// stats.accumulate(&sample, &values);
/// if let Some(summary) = stats.take_if_full() {
///     output.report_window(&summary);
/// }
/// ```
pub struct StatsAggregator {
    channels: [ChannelAccumulator; STAT_CHANNELS],
    /// Votes for Red, Green, Blue
    color_votes: [u32; 3],
    sample_count: u32,
    window_size: u32,
}

impl StatsAggregator {
    /// Create an empty window that completes after `window_size` samples
    pub const fn new(window_size: u32) -> Self {
        Self {
            channels: [ChannelAccumulator::EMPTY; STAT_CHANNELS],
            color_votes: [0; 3],
            sample_count: 0,
            window_size,
        }
    }

    /// Clear every accumulator, vote and the sample counter
    pub fn reset(&mut self) {
        self.channels = [ChannelAccumulator::EMPTY; STAT_CHANNELS];
        self.color_votes = [0; 3];
        self.sample_count = 0;
    }

    /// Fold one sample into the window.
    ///
    /// `Unknown` dominant colors are not counted as votes but the sample
    /// still counts toward the window.
    pub fn accumulate(&mut self, sample: &SensorSample, values: &ConvertedValues) {
        let readings = [
            (StatChannel::Temperature, values.temperature_x100),
            (StatChannel::Humidity, values.humidity_x100),
            (StatChannel::Light, values.light_pct_x10),
            (StatChannel::Soil, values.soil_pct_x10),
            (StatChannel::AccelX, values.accel_ms2_x100[0]),
            (StatChannel::AccelY, values.accel_ms2_x100[1]),
            (StatChannel::AccelZ, values.accel_ms2_x100[2]),
        ];
        for (channel, value) in readings {
            self.channels[channel.index()].add(value);
        }

        match sample.dominant_color {
            DominantColor::Red => self.color_votes[0] += 1,
            DominantColor::Green => self.color_votes[1] += 1,
            DominantColor::Blue => self.color_votes[2] += 1,
            DominantColor::Unknown => {}
        }

        self.sample_count += 1;
        debug!("Stats window: {}/{} samples", self.sample_count, self.window_size);
    }

    pub const fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub const fn window_size(&self) -> u32 {
        self.window_size
    }

    /// Whether the configured number of samples has been accumulated
    pub const fn is_full(&self) -> bool {
        self.sample_count >= self.window_size
    }

    /// Summarize the window so far.
    ///
    /// Means use integer division truncating toward zero. Returns `None` for
    /// an empty window.
    pub fn summarize(&self) -> Option<WindowSummary> {
        if self.sample_count == 0 {
            return None;
        }

        let count = i64::from(self.sample_count);
        let mut channels = [ChannelSummary::default(); STAT_CHANNELS];
        for (summary, acc) in channels.iter_mut().zip(self.channels.iter()) {
            *summary = ChannelSummary {
                mean: (acc.sum / count) as i32,
                min: acc.min,
                max: acc.max,
            };
        }

        Some(WindowSummary {
            channels,
            dominant_color: window_dominant(self.color_votes),
            sample_count: self.sample_count,
        })
    }

    /// Summarize and reset if the window is complete.
    pub fn take_if_full(&mut self) -> Option<WindowSummary> {
        if !self.is_full() {
            return None;
        }

        let summary = self.summarize();
        self.reset();
        summary
    }
}

/// Most-voted color, ties resolved Red, then Green, then Blue.
fn window_dominant([red, green, blue]: [u32; 3]) -> DominantColor {
    if red == 0 && green == 0 && blue == 0 {
        return DominantColor::Unknown;
    }

    DominantColor::classify(red, green, blue)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_with(color: DominantColor) -> SensorSample {
        SensorSample {
            dominant_color: color,
            ..Default::default()
        }
    }

    fn values_with_temperature(temperature_x100: i32) -> ConvertedValues {
        ConvertedValues {
            temperature_x100,
            ..Default::default()
        }
    }

    #[test]
    fn test_dominant_color_tie_break() {
        assert_eq!(window_dominant([5, 5, 5]), DominantColor::Red);
        assert_eq!(window_dominant([0, 5, 5]), DominantColor::Green);
        assert_eq!(window_dominant([0, 0, 0]), DominantColor::Unknown);
        assert_eq!(window_dominant([1, 0, 4]), DominantColor::Blue);
        assert_eq!(window_dominant([4, 0, 4]), DominantColor::Red);
    }

    #[test]
    fn test_mean_truncates() {
        let mut stats = StatsAggregator::new(2);
        let sample = sample_with(DominantColor::Green);
        stats.accumulate(&sample, &values_with_temperature(3));
        stats.accumulate(&sample, &values_with_temperature(4));

        let summary = stats.summarize().unwrap();
        let temperature = summary.channel(StatChannel::Temperature);
        assert_eq!(temperature.mean, 3);
        assert_eq!(temperature.min, 3);
        assert_eq!(temperature.max, 4);

        // Toward zero for negatives as well
        let mut stats = StatsAggregator::new(2);
        stats.accumulate(&sample, &values_with_temperature(-3));
        stats.accumulate(&sample, &values_with_temperature(-4));
        assert_eq!(
            stats.summarize().unwrap().channel(StatChannel::Temperature).mean,
            -3
        );
    }

    #[test]
    fn test_empty_window_has_no_summary() {
        let stats = StatsAggregator::new(120);
        assert!(stats.summarize().is_none());
        assert!(!stats.is_full());
    }

    #[test]
    fn test_unknown_colors_are_not_votes() {
        let mut stats = StatsAggregator::new(3);
        let values = ConvertedValues::default();
        stats.accumulate(&sample_with(DominantColor::Unknown), &values);
        stats.accumulate(&sample_with(DominantColor::Unknown), &values);

        let summary = stats.summarize().unwrap();
        assert_eq!(summary.sample_count, 2);
        assert_eq!(summary.dominant_color, DominantColor::Unknown);

        stats.accumulate(&sample_with(DominantColor::Blue), &values);
        assert_eq!(stats.summarize().unwrap().dominant_color, DominantColor::Blue);
    }

    #[test]
    fn test_window_lifecycle() {
        let mut stats = StatsAggregator::new(4);
        let sample = sample_with(DominantColor::Red);

        for temperature in [1_000, 2_000, 3_000] {
            stats.accumulate(&sample, &values_with_temperature(temperature));
            assert!(stats.take_if_full().is_none());
        }
        stats.accumulate(&sample, &values_with_temperature(4_000));
        assert!(stats.is_full());

        let summary = stats.take_if_full().unwrap();
        assert_eq!(summary.sample_count, 4);
        assert_eq!(summary.channel(StatChannel::Temperature).mean, 2_500);
        assert_eq!(summary.dominant_color, DominantColor::Red);
        assert_eq!(stats.sample_count(), 0);

        // The next sample starts a fresh mean
        stats.accumulate(&sample, &values_with_temperature(-700));
        let fresh = stats.summarize().unwrap();
        assert_eq!(fresh.channel(StatChannel::Temperature).mean, -700);
        assert_eq!(fresh.channel(StatChannel::Temperature).min, -700);
        assert_eq!(fresh.channel(StatChannel::Temperature).max, -700);
    }

    #[test]
    fn test_acceleration_axes_tracked_separately() {
        let mut stats = StatsAggregator::new(2);
        let sample = sample_with(DominantColor::Green);
        let mut values = ConvertedValues::default();
        values.accel_ms2_x100 = [100, -200, 981];
        stats.accumulate(&sample, &values);
        values.accel_ms2_x100 = [300, 0, 981];
        stats.accumulate(&sample, &values);

        let summary = stats.summarize().unwrap();
        assert_eq!(summary.channel(StatChannel::AccelX).mean, 200);
        assert_eq!(summary.channel(StatChannel::AccelY).min, -200);
        assert_eq!(summary.channel(StatChannel::AccelY).max, 0);
        assert_eq!(summary.channel(StatChannel::AccelZ).mean, 981);
    }

    #[test]
    fn test_reset_clears_extremes() {
        let mut stats = StatsAggregator::new(10);
        let sample = sample_with(DominantColor::Green);
        stats.accumulate(&sample, &values_with_temperature(9_000));
        stats.reset();
        assert_eq!(stats.sample_count(), 0);
        assert!(stats.summarize().is_none());

        stats.accumulate(&sample, &values_with_temperature(100));
        let summary = stats.summarize().unwrap();
        assert_eq!(summary.channel(StatChannel::Temperature).max, 100);
        assert_eq!(summary.dominant_color, DominantColor::Green);
    }
}
