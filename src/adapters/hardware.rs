//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the [`Co2Sensor`] and every indicator driver, exposing them
//! through [`SensorPort`] and [`IndicatorPort`].  This is the only module
//! in the system that touches the sensor and the indicator pins.  On
//! non-espidf targets the indicator drivers write to the simulated GPIO
//! table.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::app::ports::{IndicatorPort, SensorPort};
use crate::drivers::indicator::{Indicator, IndicatorDriver};
use crate::error::SensorError;
use crate::pins;
use crate::sensors::{Co2Sensor, Measurement};

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<I2C, D> {
    sensor: Co2Sensor<I2C, D>,
    indicators: [IndicatorDriver; Indicator::COUNT],
}

impl<I2C, D> HardwareAdapter<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// `sensor` must already be initialised.
    pub fn new(sensor: Co2Sensor<I2C, D>) -> Self {
        Self {
            sensor,
            indicators: [
                IndicatorDriver::new(pins::HVAC_HEATING_LED),
                IndicatorDriver::new(pins::HVAC_COOLING_LED),
                IndicatorDriver::new(pins::CO2_ALERT_LED),
                IndicatorDriver::new(pins::CO2_BUZZER),
                IndicatorDriver::new(pins::CLOUD_CONNECTED_LED),
            ],
        }
    }

    /// Indicators off and sensor measurement stopped.
    pub fn shutdown(&mut self) {
        self.all_off();
        self.sensor.shutdown();
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<I2C, D> SensorPort for HardwareAdapter<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    fn read_measurement(&mut self) -> Result<Measurement, SensorError> {
        self.sensor.read()
    }
}

// ── IndicatorPort implementation ──────────────────────────────

impl<I2C, D> IndicatorPort for HardwareAdapter<I2C, D> {
    fn set_indicator(&mut self, which: Indicator, on: bool) {
        let driver = &mut self.indicators[which as usize];
        if driver.is_on() != on {
            log::debug!("{} -> {}", driver.name(), if on { "on" } else { "off" });
        }
        driver.set(on);
    }

    fn is_indicator_on(&self, which: Indicator) -> bool {
        self.indicators[which as usize].is_on()
    }
}
