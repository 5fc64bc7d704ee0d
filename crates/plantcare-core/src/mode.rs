//! TEST/NORMAL mode controller
//!
//! The sole consumer of the state plane. Each polling tick it first checks
//! the button edge (a press toggles the mode immediately), then takes a
//! sample if the current period has elapsed:
//!
//! ```text
//! snapshot -> convert -> evaluate -> indicator + report
//!                                 -> (Normal) accumulate -> window summary
//! ```

use embassy_time::{Duration, Instant, Timer};
use log::{debug, info};

use crate::alarm::{AlarmColor, first_violation};
use crate::app_state::{Mode, PlantcareContext};
use crate::config::{ConfigError, PlantcareConfig};
use crate::output::{SampleReport, StatusOutput};
use crate::stats::StatsAggregator;
use crate::units::ConvertedValues;

/// What one polling tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A button edge switched the controller into this mode
    Transitioned(Mode),
    /// A sample was evaluated and drove the indicator to this color
    Sampled(AlarmColor),
    /// Nothing was due
    Idle,
}

pub struct ModeController<'a, O> {
    ctx: &'a PlantcareContext,
    config: PlantcareConfig,
    output: O,
    stats: StatsAggregator,
    mode: Mode,
    last_sample: Option<Instant>,
    /// State plane version last folded into the window
    last_accumulated: Option<u32>,
}

impl<'a, O: StatusOutput> ModeController<'a, O> {
    /// Create a controller; it does nothing until [`start`](Self::start).
    pub fn new(
        ctx: &'a PlantcareContext,
        config: PlantcareConfig,
        output: O,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            ctx,
            stats: StatsAggregator::new(config.window_size_samples),
            config,
            output,
            mode: Mode::Test,
            last_sample: None,
            last_accumulated: None,
        })
    }

    /// Enter the initial TEST mode
    pub fn start(&mut self) {
        self.enter(Mode::Test);
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }

    /// Sampling period of `mode`, in milliseconds
    pub fn period_ms(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Test => self.config.test_period_ms,
            Mode::Normal => self.config.normal_period_ms,
        }
    }

    fn enter(&mut self, mode: Mode) {
        let period_ms = self.period_ms(mode);
        self.mode = mode;
        self.ctx.set_mode(mode, period_ms);
        self.output.set_mode_leds(mode == Mode::Test, mode == Mode::Normal);

        if mode == Mode::Normal {
            self.stats.reset();
            self.last_accumulated = None;
        }
        // Sample on the first tick in the new mode
        self.last_sample = None;

        info!("Entered {} mode ({} ms period)", mode.label(), period_ms);
    }

    /// One polling step at time `now`.
    ///
    /// A pending button edge always wins over a due sample. Nothing is
    /// sampled until the producer has published at least once.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        if self.ctx.button().take() {
            let next = self.mode.toggled();
            info!("Button pressed: {} -> {}", self.mode.label(), next.label());
            self.enter(next);
            return TickOutcome::Transitioned(next);
        }

        let due = match self.last_sample {
            None => true,
            Some(last) => {
                now >= last + Duration::from_millis(u64::from(self.period_ms(self.mode)))
            }
        };
        if !due || self.ctx.state().version() == 0 {
            return TickOutcome::Idle;
        }

        self.last_sample = Some(now);
        TickOutcome::Sampled(self.sample())
    }

    fn sample(&mut self) -> AlarmColor {
        let (version, sample) = self.ctx.state().versioned_snapshot();
        let values = ConvertedValues::from_sample(&sample, &self.config);
        let condition = first_violation(&values, &sample, &self.config.thresholds);
        let color = condition.map_or(AlarmColor::Off, |c| c.color());

        debug!(
            "{} sample: {} -> {}",
            self.mode.label(),
            condition.map_or("healthy", |c| c.label()),
            color.label()
        );

        self.output.set_indicator(color.rgb());
        self.output.report_sample(&SampleReport {
            mode: self.mode,
            sample: &sample,
            values: &values,
            condition,
            color,
        });

        // The same acquisition is counted once even if sampled twice
        if self.mode == Mode::Normal && self.last_accumulated != Some(version) {
            self.last_accumulated = Some(version);
            self.stats.accumulate(&sample, &values);
            if let Some(summary) = self.stats.take_if_full() {
                info!("Window complete: {}", summary);
                self.output.report_window(&summary);
            }
        }

        color
    }

    /// Run the controller forever, polling every `poll_interval_ms`.
    pub async fn run(&mut self) {
        let poll = Duration::from_millis(u64::from(self.config.poll_interval_ms));
        self.start();

        loop {
            self.tick(Instant::now());
            Timer::after(poll).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::RgbState;
    use crate::output::recording::RecordingOutput;
    use crate::sample::{DominantColor, SensorSample};
    use crate::stats::StatChannel;

    fn healthy_sample() -> SensorSample {
        SensorSample {
            soil_raw: 2048,
            light_raw: 200,
            temperature_x100: 2_200,
            humidity_x100: 5_000,
            accel_z_g100: 100,
            color_green: 500,
            dominant_color: DominantColor::Green,
            ..Default::default()
        }
    }

    fn controller(ctx: &PlantcareContext) -> ModeController<'_, RecordingOutput> {
        let config = PlantcareConfig {
            window_size_samples: 3,
            ..PlantcareConfig::new()
        };
        ModeController::new(ctx, config, RecordingOutput::default()).unwrap()
    }

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn test_starts_in_test_mode() {
        let ctx = PlantcareContext::new();
        let mut ctl = controller(&ctx);
        ctl.start();

        assert_eq!(ctl.mode(), Mode::Test);
        assert_eq!(ctx.mode(), Mode::Test);
        assert_eq!(ctx.sampling_period(), Duration::from_millis(2_000));
        assert_eq!(ctl.output().mode_leds, [(true, false)]);
    }

    #[test]
    fn test_edge_toggles_exactly_once() {
        let ctx = PlantcareContext::new();
        let mut ctl = controller(&ctx);
        ctl.start();

        ctx.button().post();
        assert_eq!(ctl.tick(at(10)), TickOutcome::Transitioned(Mode::Normal));
        assert_eq!(ctx.mode(), Mode::Normal);
        assert_eq!(ctx.sampling_period(), Duration::from_secs(30));
        assert_eq!(ctl.output().mode_leds.last(), Some(&(false, true)));

        // No new edge, no new transition
        assert_eq!(ctl.tick(at(20)), TickOutcome::Idle);
        assert_eq!(ctl.mode(), Mode::Normal);

        ctx.button().post();
        assert_eq!(ctl.tick(at(30)), TickOutcome::Transitioned(Mode::Test));
        assert_eq!(ctx.sampling_period(), Duration::from_millis(2_000));
    }

    #[test]
    fn test_edge_wins_over_due_sample() {
        let ctx = PlantcareContext::new();
        ctx.state().publisher().unwrap().publish(&healthy_sample());
        let mut ctl = controller(&ctx);
        ctl.start();

        ctx.button().post();
        assert_eq!(ctl.tick(at(0)), TickOutcome::Transitioned(Mode::Normal));
        assert!(ctl.output().samples.is_empty());

        // First tick in the new mode samples right away
        assert_eq!(ctl.tick(at(50)), TickOutcome::Sampled(AlarmColor::Off));
    }

    #[test]
    fn test_sampling_cadence() {
        let ctx = PlantcareContext::new();
        ctx.state().publisher().unwrap().publish(&healthy_sample());
        let mut ctl = controller(&ctx);
        ctl.start();

        assert_eq!(ctl.tick(at(0)), TickOutcome::Sampled(AlarmColor::Off));
        assert_eq!(ctl.tick(at(1_950)), TickOutcome::Idle);
        assert_eq!(ctl.tick(at(2_000)), TickOutcome::Sampled(AlarmColor::Off));
        assert_eq!(ctl.tick(at(2_050)), TickOutcome::Idle);
        assert_eq!(ctl.output().samples.len(), 2);
    }

    #[test]
    fn test_no_sample_before_first_publish() {
        let ctx = PlantcareContext::new();
        let mut ctl = controller(&ctx);
        ctl.start();

        assert_eq!(ctl.tick(at(0)), TickOutcome::Idle);
        ctx.state().publisher().unwrap().publish(&healthy_sample());
        assert_eq!(ctl.tick(at(50)), TickOutcome::Sampled(AlarmColor::Off));
    }

    #[test]
    fn test_alarm_drives_indicator() {
        let ctx = PlantcareContext::new();
        let mut sample = healthy_sample();
        sample.temperature_x100 = 3_500;
        sample.humidity_x100 = 9_000;
        ctx.state().publisher().unwrap().publish(&sample);

        let mut ctl = controller(&ctx);
        ctl.start();

        assert_eq!(ctl.tick(at(0)), TickOutcome::Sampled(AlarmColor::Red));
        assert_eq!(ctl.output().indicator, [RgbState::new(true, false, false)]);
        let (mode, condition, color) = ctl.output().samples[0];
        assert_eq!(mode, Mode::Test);
        assert_eq!(condition, Some(crate::alarm::AlarmCondition::Temperature));
        assert_eq!(color, AlarmColor::Red);
    }

    #[test]
    fn test_test_mode_does_not_accumulate() {
        let ctx = PlantcareContext::new();
        ctx.state().publisher().unwrap().publish(&healthy_sample());
        let mut ctl = controller(&ctx);
        ctl.start();

        for i in 0..5 {
            ctl.tick(at(i * 2_000));
        }
        assert_eq!(ctl.stats().sample_count(), 0);
        assert!(ctl.output().windows.is_empty());
    }

    #[test]
    fn test_normal_mode_reports_full_window() {
        let ctx = PlantcareContext::new();
        let mut publisher = ctx.state().publisher().unwrap();
        let mut ctl = controller(&ctx);
        ctl.start();
        ctx.button().post();
        ctl.tick(at(0));

        let mut t = 0;
        for temperature in [2_000, 2_100, 2_201] {
            let mut sample = healthy_sample();
            sample.temperature_x100 = temperature;
            publisher.publish(&sample);
            t += 30_000;
            assert!(matches!(ctl.tick(at(t)), TickOutcome::Sampled(_)));
        }

        let windows = &ctl.output().windows;
        assert_eq!(windows.len(), 1);
        let temperature = windows[0].channel(StatChannel::Temperature);
        assert_eq!(temperature.min, 2_000);
        assert_eq!(temperature.max, 2_201);
        assert_eq!(temperature.mean, 2_100);
        assert_eq!(windows[0].dominant_color, DominantColor::Green);
        assert_eq!(windows[0].sample_count, 3);

        // The window starts over after the summary
        assert_eq!(ctl.stats().sample_count(), 0);
    }

    #[test]
    fn test_entering_normal_resets_window() {
        let ctx = PlantcareContext::new();
        let mut publisher = ctx.state().publisher().unwrap();
        publisher.publish(&healthy_sample());
        let mut ctl = controller(&ctx);
        ctl.start();

        ctx.button().post();
        ctl.tick(at(0));
        ctl.tick(at(10));
        publisher.publish(&healthy_sample());
        ctl.tick(at(30_010));
        assert_eq!(ctl.stats().sample_count(), 2);

        // Normal -> Test -> Normal drops the partial window
        ctx.button().post();
        ctl.tick(at(30_020));
        ctx.button().post();
        ctl.tick(at(30_030));
        assert_eq!(ctl.stats().sample_count(), 0);

        // The latest publish counts again in the fresh window
        ctl.tick(at(30_040));
        publisher.publish(&healthy_sample());
        ctl.tick(at(60_040));
        assert!(ctl.output().windows.is_empty());
        publisher.publish(&healthy_sample());
        ctl.tick(at(90_040));
        assert_eq!(ctl.output().windows.len(), 1);
    }

    #[test]
    fn test_unchanged_publish_is_accumulated_once() {
        let ctx = PlantcareContext::new();
        let mut publisher = ctx.state().publisher().unwrap();
        publisher.publish(&healthy_sample());
        let mut ctl = controller(&ctx);
        ctl.start();
        ctx.button().post();
        ctl.tick(at(0));

        // The producer has not published again between these samples
        assert_eq!(ctl.tick(at(10)), TickOutcome::Sampled(AlarmColor::Off));
        assert_eq!(ctl.tick(at(30_010)), TickOutcome::Sampled(AlarmColor::Off));
        assert_eq!(ctl.tick(at(60_010)), TickOutcome::Sampled(AlarmColor::Off));
        assert_eq!(ctl.output().samples.len(), 3);
        assert_eq!(ctl.stats().sample_count(), 1);

        publisher.publish(&healthy_sample());
        ctl.tick(at(90_010));
        assert_eq!(ctl.stats().sample_count(), 2);
        assert!(ctl.output().windows.is_empty());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let ctx = PlantcareContext::new();
        let config = PlantcareConfig {
            window_size_samples: 0,
            ..PlantcareConfig::new()
        };
        assert!(matches!(
            ModeController::new(&ctx, config, RecordingOutput::default()),
            Err(ConfigError::InvalidWindow)
        ));
    }
}
