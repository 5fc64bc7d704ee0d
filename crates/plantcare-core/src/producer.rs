//! The producer role: acquire sensors, publish samples

use embassy_time::{Duration, Timer};
use log::{debug, info};

use crate::app_state::PlantcareContext;
use crate::config::PlantcareConfig;
use crate::sample::SensorSample;
use crate::sensors::{
    AccelReadings, ClimateReadings, ColorReadings, GpsSource, LightReadings, Sensor, SensorError,
    SensorHub, SoilReadings,
};
use crate::state_plane::StatePublisher;

/// Periodically reads every sensor and publishes the result to the context's
/// state plane.
///
/// Holds the plane's only [`StatePublisher`], so at most one producer exists
/// per context.
pub struct SampleProducer<'a, So, Li, Cl, Ac, Co, G> {
    ctx: &'a PlantcareContext,
    publisher: StatePublisher<'a>,
    hub: SensorHub<So, Li, Cl, Ac, Co, G>,
    last: SensorSample,
    not_ready_backoff: Duration,
}

impl<'a, So, Li, Cl, Ac, Co, G> SampleProducer<'a, So, Li, Cl, Ac, Co, G>
where
    So: Sensor<Readings = SoilReadings>,
    Li: Sensor<Readings = LightReadings>,
    Cl: Sensor<Readings = ClimateReadings>,
    Ac: Sensor<Readings = AccelReadings>,
    Co: Sensor<Readings = ColorReadings>,
    G: GpsSource,
{
    /// Returns `None` if another producer already publishes to `ctx`.
    pub fn new(
        ctx: &'a PlantcareContext,
        hub: SensorHub<So, Li, Cl, Ac, Co, G>,
        config: &PlantcareConfig,
    ) -> Option<Self> {
        let publisher = ctx.state().publisher()?;
        Some(Self {
            ctx,
            publisher,
            hub,
            last: SensorSample::default(),
            not_ready_backoff: Duration::from_millis(u64::from(config.not_ready_backoff_ms)),
        })
    }

    /// Acquire and publish one sample.
    ///
    /// Returns the number of channels that kept a stale value, or
    /// [`SensorError::NotReady`] without touching the sensors if the context
    /// has not been marked ready.
    pub async fn step(&mut self) -> Result<u8, SensorError> {
        if !self.ctx.sensors_ready() {
            return Err(SensorError::NotReady);
        }

        let acquisition = self.hub.read_all(&self.last).await;
        self.publisher.publish(&acquisition.sample);
        self.last = acquisition.sample;

        debug!(
            "Published sample v{} ({} stale)",
            self.ctx.state().version(),
            acquisition.stale_channels
        );
        Ok(acquisition.stale_channels)
    }

    /// The most recently published sample
    pub fn last_published(&self) -> &SensorSample {
        &self.last
    }

    pub fn hub_mut(&mut self) -> &mut SensorHub<So, Li, Cl, Ac, Co, G> {
        &mut self.hub
    }

    /// Run the producer forever.
    ///
    /// Sleeps the context's current sampling period between cycles, so a mode
    /// change takes effect after the cycle already in progress.
    pub async fn run(&mut self) {
        info!("Sample producer started");
        let mut waiting = false;

        loop {
            match self.step().await {
                Ok(_) => {
                    waiting = false;
                    Timer::after(self.ctx.sampling_period()).await;
                }
                // `step` only fails while the sensors are not ready
                Err(_) => {
                    if !waiting {
                        info!("Waiting for sensors to become ready");
                        waiting = true;
                    }
                    Timer::after(self.not_ready_backoff).await;
                }
            }
        }
    }
}
