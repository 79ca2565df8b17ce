//! Sensor subsystem: the SCD30 driver and the [`Co2Sensor`] bring-up /
//! polling wrapper the application talks to.

pub mod scd30;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{info, warn};

use crate::config::SystemConfig;
use crate::error::SensorError;
use scd30::Scd30;

/// Pause between setting the interval and starting measurement.
const INTERVAL_SETTLE_MS: u32 = 20;

/// One CO2 / temperature / humidity sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub co2_ppm: f32,
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

/// Owns the SCD30 and applies the start-up sequence from [`SystemConfig`].
pub struct Co2Sensor<I2C, D> {
    scd30: Scd30<I2C, D>,
}

impl<I2C, D> Co2Sensor<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn new(scd30: Scd30<I2C, D>) -> Self {
        Self { scd30 }
    }

    /// Probe, enable auto self-calibration, set the sampling interval and
    /// start continuous measurement.
    ///
    /// Blocks for up to `probe_attempts * probe_retry_delay_ms` plus one
    /// sampling interval.  Only call this before the event loop starts.
    pub fn initialise(&mut self, cfg: &SystemConfig) -> Result<(), SensorError> {
        self.probe_with_retry(cfg.probe_attempts, cfg.probe_retry_delay_ms)?;

        // ASC needs 7 days of continuous power with daily fresh-air exposure
        // before it settles.
        match self.scd30.automatic_self_calibration() {
            Ok(true) => {}
            Ok(false) => match self.scd30.set_automatic_self_calibration(true) {
                Ok(()) => info!("SCD30: automatic self calibration enabled"),
                Err(e) => warn!("SCD30: enabling ASC failed: {}", e),
            },
            Err(e) => warn!("SCD30: reading ASC state failed: {}", e),
        }

        let interval = cfg.sensor_interval_secs;
        self.scd30
            .set_measurement_interval(interval)
            .map_err(SensorError::from)?;
        self.scd30.delay_ms(INTERVAL_SETTLE_MS);
        self.scd30
            .start_periodic_measurement(0)
            .map_err(SensorError::from)?;
        // First sample is only available after one full interval.
        self.scd30.delay_ms(u32::from(interval) * 1000);

        info!("SCD30: periodic measurement started ({}s interval)", interval);
        Ok(())
    }

    /// Read the latest sample.  A NaN CO2 value is reported as
    /// [`SensorError::InvalidReading`].
    pub fn read(&mut self) -> Result<Measurement, SensorError> {
        let m = self.scd30.read_measurement()?;
        if m.co2_ppm.is_nan() {
            return Err(SensorError::InvalidReading);
        }
        Ok(m)
    }

    /// Stop continuous measurement.  Errors are logged, not returned; this
    /// runs on the exit path.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.scd30.stop_periodic_measurement() {
            warn!("SCD30: stop measurement failed: {}", e);
        }
    }

    fn probe_with_retry(&mut self, attempts: u8, retry_delay_ms: u32) -> Result<(), SensorError> {
        for attempt in 1..=attempts {
            match self.scd30.probe() {
                Ok(version) => {
                    info!(
                        "SCD30: found, firmware {}.{}",
                        version >> 8,
                        version & 0xFF
                    );
                    return Ok(());
                }
                Err(e) => {
                    warn!("SCD30: probe {}/{} failed: {}", attempt, attempts, e);
                    if attempt < attempts {
                        self.scd30.delay_ms(retry_delay_ms);
                    }
                }
            }
        }
        Err(SensorError::ProbeFailed)
    }
}
