//! Desktop simulator for the plantcare monitor core.
//!
//! Runs the sample producer and the mode controller on the host executor,
//! fed by synthetic sensors, and prints everything the board would show on
//! its LEDs to the log.
//!
//! # Controls
//!
//! | Input           | Action                          |
//! |-----------------|---------------------------------|
//! | Enter           | Press the mode button           |
//! | `q` + Enter     | Quit                            |
//!
//! Set `RUST_LOG=debug` to see every sample, and `PLANTCARE_CONFIG` to the
//! path of a postcard config blob to override the defaults.

use std::collections::VecDeque;
use std::io::BufRead;
use std::time::Instant;

use embassy_executor::Spawner;
use embassy_futures::join::join3;
use embassy_time::Timer;
use log::{debug, error, info, warn};

use plantcare_core::alarm::RgbState;
use plantcare_core::app_state::{EdgeDetector, Mode, PlantcareContext};
use plantcare_core::config::PlantcareConfig;
use plantcare_core::mode::ModeController;
use plantcare_core::output::{SampleReport, StatusOutput};
use plantcare_core::producer::SampleProducer;
use plantcare_core::sensors::{
    AccelReadings, ClimateReadings, ColorReadings, GpsSource, LightReadings, Sensor, SensorError,
    SensorHub, SoilReadings,
};
use plantcare_core::stats::WindowSummary;

/// Shared between the executor tasks and the stdin button thread.
static CONTEXT: PlantcareContext = PlantcareContext::new();

/// Simulated sensor bring-up time before the producer may publish.
const SENSOR_INIT_MS: u64 = 500;

/// Every n-th climate read fails, to exercise stale-channel handling.
const CLIMATE_FAILURE_EVERY: u32 = 17;

/// Interval between synthetic GPS sentences.
const GPS_SENTENCE_INTERVAL_SECS: f64 = 5.0;

// ---------------------------------------------------------------------------
// Mock sensors
// ---------------------------------------------------------------------------

/// Seconds since the simulator started, the phase for every waveform.
fn phase(started: Instant) -> f64 {
    started.elapsed().as_secs_f64()
}

struct MockSoil {
    started: Instant,
}

impl Sensor for MockSoil {
    type Readings = SoilReadings;
    const NAME: &'static str = "soil";

    async fn read(&mut self) -> Result<SoilReadings, SensorError> {
        let t = phase(self.started);
        // Slowly drying out, with a watering every ~10 minutes
        let raw = 2_600.0 - 1_400.0 * ((t % 600.0) / 600.0) + 40.0 * (t / 13.0).sin();
        Ok(SoilReadings {
            raw: raw as i16,
            millivolts: (raw * 3_300.0 / 4_095.0) as i32,
        })
    }
}

struct MockLight {
    started: Instant,
}

impl Sensor for MockLight {
    type Readings = LightReadings;
    const NAME: &'static str = "light";

    async fn read(&mut self) -> Result<LightReadings, SensorError> {
        let t = phase(self.started);
        let raw = 200.0 + 190.0 * (t / 90.0).sin();
        Ok(LightReadings {
            raw: raw as i16,
            millivolts: (raw * 3_300.0 / 4_095.0) as i32,
        })
    }
}

struct MockClimate {
    started: Instant,
    reads: u32,
}

impl Sensor for MockClimate {
    type Readings = ClimateReadings;
    const NAME: &'static str = "climate";

    async fn read(&mut self) -> Result<ClimateReadings, SensorError> {
        self.reads += 1;
        if self.reads % CLIMATE_FAILURE_EVERY == 0 {
            return Err(SensorError::AcquisitionFailure {
                sensor: Self::NAME,
                details: "simulated bus timeout",
            });
        }

        let t = phase(self.started);
        // 20–32 °C so the temperature alarm trips near the peak
        let temperature = 26.0 + 6.0 * (t / 120.0).sin() + 0.5 * (t / 37.0).cos();
        let humidity = 50.0 + 15.0 * (t / 180.0).sin() + 2.0 * (t / 23.0).cos();
        Ok(ClimateReadings {
            temperature_x100: (temperature * 100.0) as i32,
            humidity_x100: (humidity * 100.0) as i32,
        })
    }
}

struct MockAccel {
    started: Instant,
}

impl Sensor for MockAccel {
    type Readings = AccelReadings;
    const NAME: &'static str = "accel";

    async fn read(&mut self) -> Result<AccelReadings, SensorError> {
        let t = phase(self.started);
        // Resting flat, with a knock every ~47 s
        let knock = if (t % 47.0) < 1.0 { 180.0 } else { 0.0 };
        Ok(AccelReadings {
            x_g100: (3.0 * (t / 5.0).sin() + knock) as i32,
            y_g100: (3.0 * (t / 7.0).cos()) as i32,
            z_g100: 100,
        })
    }
}

struct MockColor {
    started: Instant,
}

impl Sensor for MockColor {
    type Readings = ColorReadings;
    const NAME: &'static str = "color";

    async fn read(&mut self) -> Result<ColorReadings, SensorError> {
        let t = phase(self.started);
        // Mostly green leaves, yellowing for part of each cycle
        let red = 300.0 + 250.0 * (t / 150.0).sin();
        let green = 450.0 + 50.0 * (t / 40.0).cos();
        let blue = 150.0 + 30.0 * (t / 60.0).sin();
        Ok(ColorReadings {
            clear: (red + green + blue) as u16,
            red: red as u16,
            green: green as u16,
            blue: blue as u16,
        })
    }
}

/// Emits a canned GGA sentence every few seconds, a byte at a time.
struct MockGps {
    started: Instant,
    next_sentence_at: f64,
    pending: VecDeque<u8>,
}

impl MockGps {
    fn new(started: Instant) -> Self {
        Self {
            started,
            next_sentence_at: 0.0,
            pending: VecDeque::new(),
        }
    }
}

impl GpsSource for MockGps {
    fn read_byte(&mut self) -> Option<u8> {
        let t = phase(self.started);
        if self.pending.is_empty() && t >= self.next_sentence_at {
            let sentence = format!(
                "$GPGGA,{:06.0},4807.038,N,01131.000,E,1,08,0.9,545.4,M,,,,*47\r\n",
                t
            );
            self.pending.extend(sentence.bytes());
            self.next_sentence_at = t + GPS_SENTENCE_INTERVAL_SECS;
        }
        self.pending.pop_front()
    }
}

// ---------------------------------------------------------------------------
// Console output
// ---------------------------------------------------------------------------

/// Stands in for the mode LEDs and the RGB indicator.
struct ConsoleOutput {
    indicator: RgbState,
}

impl StatusOutput for ConsoleOutput {
    fn set_mode_leds(&mut self, test_led: bool, normal_led: bool) {
        info!(
            "Mode LEDs: blue(TEST)={} green(NORMAL)={}",
            on_off(test_led),
            on_off(normal_led)
        );
    }

    fn set_indicator(&mut self, rgb: RgbState) {
        if rgb != self.indicator {
            info!(
                "Indicator: R={} G={} B={}",
                on_off(rgb.red),
                on_off(rgb.green),
                on_off(rgb.blue)
            );
            self.indicator = rgb;
        }
    }

    fn report_sample(&mut self, report: &SampleReport<'_>) {
        let status = report.condition.map_or("healthy", |c| c.label());
        match report.mode {
            Mode::Test => info!("{} | {} ({})", report.sample, status, report.color.label()),
            Mode::Normal => debug!("{} | {} ({})", report.sample, status, report.color.label()),
        }
    }

    fn report_window(&mut self, summary: &WindowSummary) {
        info!("Hourly summary:\n{}", summary);
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

// ---------------------------------------------------------------------------
// Setup helpers
// ---------------------------------------------------------------------------

/// Defaults, optionally replaced by the postcard blob named in
/// `PLANTCARE_CONFIG`.
fn load_config() -> PlantcareConfig {
    let Ok(path) = std::env::var("PLANTCARE_CONFIG") else {
        return PlantcareConfig::new();
    };

    match std::fs::read(&path) {
        Ok(bytes) => match PlantcareConfig::from_postcard(&bytes) {
            Ok(config) => {
                info!("Loaded config from {}", path);
                config
            }
            Err(e) => {
                warn!("Ignoring {}: {}", path, e);
                PlantcareConfig::new()
            }
        },
        Err(e) => {
            warn!("Cannot read {}: {}", path, e);
            PlantcareConfig::new()
        }
    }
}

/// Stdin stands in for the button: each line is a press and release.
fn spawn_button_thread() {
    std::thread::spawn(|| {
        let mut detector = EdgeDetector::new();
        detector.update_into(false, CONTEXT.button());

        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if line.trim().eq_ignore_ascii_case("q") {
                info!("Simulator exiting");
                std::process::exit(0);
            }
            detector.update_into(true, CONTEXT.button());
            detector.update_into(false, CONTEXT.button());
        }
    });
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    env_logger::init();
    info!("Starting plantcare simulator");
    info!("Keys: Enter=mode button  q+Enter=quit");

    let config = load_config();
    let started = Instant::now();

    let hub = SensorHub::new(
        MockSoil { started },
        MockLight { started },
        MockClimate { started, reads: 0 },
        MockAccel { started },
        MockColor { started },
        MockGps::new(started),
        config.gps_max_bytes_per_cycle,
    );

    let Some(mut producer) = SampleProducer::new(&CONTEXT, hub, &config) else {
        error!("State plane already has a producer");
        return;
    };
    let mut controller = match ModeController::new(
        &CONTEXT,
        config,
        ConsoleOutput {
            indicator: RgbState::OFF,
        },
    ) {
        Ok(controller) => controller,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return;
        }
    };

    spawn_button_thread();

    let boot = async {
        Timer::after_millis(SENSOR_INIT_MS).await;
        CONTEXT.mark_sensors_ready();
        info!("Sensors ready");
    };

    join3(boot, producer.run(), controller.run()).await;
}
