//! Process-wide shared state for plantcare
//!
//! Everything the producer, the mode controller and the button source share
//! lives in one [`PlantcareContext`], normally placed in a `static` and handed
//! out by reference. Every field is lock-free.
//!
//! | field              | writer             | readers              |
//! |--------------------|--------------------|----------------------|
//! | state plane        | producer           | mode controller, any |
//! | mode, period       | mode controller    | producer             |
//! | sensors ready      | boot code          | producer             |
//! | button edge        | async edge source  | mode controller      |

mod button;

pub use button::*;

use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use embassy_time::Duration;

use crate::config::DEFAULT_TEST_PERIOD_MS;
use crate::state_plane::StatePlane;

/// Operating cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    /// Fast, verbose sampling
    Test = 0,
    /// Slow sampling with hourly statistics
    Normal = 1,
}

impl Mode {
    /// The mode a button press switches to
    pub const fn toggled(self) -> Self {
        match self {
            Self::Test => Self::Normal,
            Self::Normal => Self::Test,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Test => "TEST",
            Self::Normal => "NORMAL",
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Normal,
            _ => Self::Test,
        }
    }
}

/// Shared context threaded through the producer and consumer roles
pub struct PlantcareContext {
    state: StatePlane,
    button: ButtonEdge,
    mode: AtomicU8,
    sampling_period_ms: AtomicU32,
    sensors_ready: AtomicBool,
}

impl PlantcareContext {
    /// Starts in TEST mode at the default TEST period, sensors not ready.
    pub const fn new() -> Self {
        Self {
            state: StatePlane::new(),
            button: ButtonEdge::new(),
            mode: AtomicU8::new(Mode::Test as u8),
            sampling_period_ms: AtomicU32::new(DEFAULT_TEST_PERIOD_MS),
            sensors_ready: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> &StatePlane {
        &self.state
    }

    pub fn button(&self) -> &ButtonEdge {
        &self.button
    }

    pub fn mode(&self) -> Mode {
        Mode::from_u8(self.mode.load(Ordering::Acquire))
    }

    /// Current producer sampling period
    pub fn sampling_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.sampling_period_ms.load(Ordering::Acquire)))
    }

    /// Publish a new mode and its sampling period.
    ///
    /// Only the mode controller calls this.
    pub(crate) fn set_mode(&self, mode: Mode, sampling_period_ms: u32) {
        self.sampling_period_ms.store(sampling_period_ms, Ordering::Release);
        self.mode.store(mode as u8, Ordering::Release);
    }

    /// Signal that sensor initialization finished and publishing may start
    pub fn mark_sensors_ready(&self) {
        self.sensors_ready.store(true, Ordering::Release);
    }

    pub fn sensors_ready(&self) -> bool {
        self.sensors_ready.load(Ordering::Acquire)
    }
}

impl Default for PlantcareContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_starts_in_test_mode() {
        let ctx = PlantcareContext::new();
        assert_eq!(ctx.mode(), Mode::Test);
        assert_eq!(ctx.sampling_period(), Duration::from_millis(2_000));
        assert!(!ctx.sensors_ready());
        assert!(!ctx.button().is_pending());
    }

    #[test]
    fn test_set_mode_updates_period() {
        let ctx = PlantcareContext::new();
        ctx.set_mode(Mode::Normal, 30_000);
        assert_eq!(ctx.mode(), Mode::Normal);
        assert_eq!(ctx.sampling_period(), Duration::from_secs(30));
    }

    #[test]
    fn test_mode_toggle() {
        assert_eq!(Mode::Test.toggled(), Mode::Normal);
        assert_eq!(Mode::Normal.toggled(), Mode::Test);
    }
}
