//! Output collaborator: mode LEDs, the RGB alarm indicator and reports

use crate::alarm::{AlarmColor, AlarmCondition, RgbState};
use crate::app_state::Mode;
use crate::sample::SensorSample;
use crate::stats::WindowSummary;
use crate::units::ConvertedValues;

/// Everything known about one evaluated sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleReport<'a> {
    pub mode: Mode,
    pub sample: &'a SensorSample,
    pub values: &'a ConvertedValues,
    /// Highest-priority violated condition, `None` when healthy
    pub condition: Option<AlarmCondition>,
    pub color: AlarmColor,
}

impl SampleReport<'_> {
    pub fn is_healthy(&self) -> bool {
        self.condition.is_none()
    }
}

/// Sink for everything the mode controller produces.
///
/// Implementations must not block for long; they are called from the
/// controller's polling loop.
pub trait StatusOutput {
    /// Drive the two mode LEDs (TEST is blue, NORMAL is green on the board)
    fn set_mode_leds(&mut self, test_led: bool, normal_led: bool);

    /// Drive the RGB alarm indicator
    fn set_indicator(&mut self, rgb: RgbState);

    fn report_sample(&mut self, report: &SampleReport<'_>);

    /// Called once per completed statistics window, Normal mode only
    fn report_window(&mut self, summary: &WindowSummary);
}
