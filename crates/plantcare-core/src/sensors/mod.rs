mod gps;
mod readings;

pub use gps::*;
pub use readings::*;

use log::warn;
use thiserror_no_std::Error;

use crate::sample::SensorSample;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor} read failed: {details}")]
    AcquisitionFailure {
        sensor: &'static str,
        details: &'static str,
    },
    #[error("Sensors are not initialized yet")]
    NotReady,
    #[error("Line exceeded the {capacity} byte buffer and was dropped")]
    Overflow { capacity: usize },
}

/// Trait for sensor reading data structures.
/// Each readings type knows which sample fields it fills.
pub trait SensorReadings {
    /// Write these readings into their fields of `sample`.
    fn apply(self, sample: &mut SensorSample);
}

/// Trait for sensor collaborators that produce typed readings.
pub trait Sensor {
    /// The type of readings this sensor produces.
    type Readings: SensorReadings;

    /// Name used in logs and errors
    const NAME: &'static str;

    /// Read the sensor once and return typed readings.
    fn read(&mut self) -> impl Future<Output = Result<Self::Readings, SensorError>>;
}

/// Read `sensor` and write its readings into their fields of `sample`.
///
/// On failure `sample` is left untouched.
pub async fn read_into<S: Sensor>(
    sensor: &mut S,
    sample: &mut SensorSample,
) -> Result<(), SensorError> {
    let readings = sensor.read().await?;
    readings.apply(sample);
    Ok(())
}

/// Outcome of one acquisition cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquisition {
    pub sample: SensorSample,
    /// Channels whose read failed and kept their previous value
    pub stale_channels: u8,
}

/// Container for all sensor collaborators
///
/// One slot per collaborator; each slot is constrained to the readings type
/// it must produce so sensors cannot be wired into the wrong fields.
pub struct SensorHub<So, Li, Cl, Ac, Co, G> {
    pub soil: So,
    pub light: Li,
    pub climate: Cl,
    pub accel: Ac,
    pub color: Co,
    pub gps: G,
    nmea: NmeaLineAssembler,
    gps_max_bytes_per_cycle: u16,
}

impl<So, Li, Cl, Ac, Co, G> SensorHub<So, Li, Cl, Ac, Co, G>
where
    So: Sensor<Readings = SoilReadings>,
    Li: Sensor<Readings = LightReadings>,
    Cl: Sensor<Readings = ClimateReadings>,
    Ac: Sensor<Readings = AccelReadings>,
    Co: Sensor<Readings = ColorReadings>,
    G: GpsSource,
{
    pub fn new(
        soil: So,
        light: Li,
        climate: Cl,
        accel: Ac,
        color: Co,
        gps: G,
        gps_max_bytes_per_cycle: u16,
    ) -> Self {
        Self {
            soil,
            light,
            climate,
            accel,
            color,
            gps,
            nmea: NmeaLineAssembler::new(),
            gps_max_bytes_per_cycle,
        }
    }

    /// Read all sensors into a new sample.
    ///
    /// The sample starts as a copy of `previous`, so any channel whose read
    /// fails keeps its previous (stale) value. Failures are logged and
    /// counted, never propagated.
    pub async fn read_all(&mut self, previous: &SensorSample) -> Acquisition {
        let mut sample = previous.clone();
        let mut stale_channels = 0;

        let result = read_into(&mut self.soil, &mut sample).await;
        note_stale(result, &mut stale_channels);
        let result = read_into(&mut self.light, &mut sample).await;
        note_stale(result, &mut stale_channels);
        let result = read_into(&mut self.climate, &mut sample).await;
        note_stale(result, &mut stale_channels);
        let result = read_into(&mut self.accel, &mut sample).await;
        note_stale(result, &mut stale_channels);
        let result = read_into(&mut self.color, &mut sample).await;
        note_stale(result, &mut stale_channels);

        self.nmea
            .drain_into(&mut self.gps, self.gps_max_bytes_per_cycle, &mut sample);

        Acquisition {
            sample,
            stale_channels,
        }
    }
}

fn note_stale(result: Result<(), SensorError>, stale_channels: &mut u8) {
    if let Err(e) = result {
        warn!("{}; keeping previous value", e);
        *stale_channels += 1;
    }
}
