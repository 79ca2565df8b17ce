//! GPIO / peripheral pin assignments for the CO2 monitor board (classic
//! ESP32, ESP32-DevKitC wiring).
//!
//! GPIO6-11 belong to the on-module SPI flash and GPIO34-39 are input-only,
//! so no output may use either range.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.

use crate::drivers::indicator::OutputPin;

// ---------------------------------------------------------------------------
// HVAC status LEDs (active-low, common-anode RGB)
// ---------------------------------------------------------------------------

/// Red: heater should run to reach the desired temperature.
pub const HVAC_HEATING_LED: OutputPin = OutputPin::active_low(4, "hvacHeatingLed");
/// Blue: cooler should run.
pub const HVAC_COOLING_LED: OutputPin = OutputPin::active_low(5, "hvacCoolingLed");

// ---------------------------------------------------------------------------
// CO2 alert
// ---------------------------------------------------------------------------

/// Green channel of the RGB LED, lit while CO2 exceeds the alert level.
pub const CO2_ALERT_LED: OutputPin = OutputPin::active_low(25, "co2AlertLed");
/// Piezo buzzer driver transistor (active-high).
pub const CO2_BUZZER: OutputPin = OutputPin::active_high(26, "co2Buzzer");

// ---------------------------------------------------------------------------
// Connectivity
// ---------------------------------------------------------------------------

/// Cloud connection status LED (active-low).
pub const CLOUD_CONNECTED_LED: OutputPin = OutputPin::active_low(2, "cloudConnectedLed");

/// Every output pin, in the order they are configured at boot.
pub const OUTPUT_PINS: [OutputPin; 5] = [
    HVAC_HEATING_LED,
    HVAC_COOLING_LED,
    CO2_ALERT_LED,
    CO2_BUZZER,
    CLOUD_CONNECTED_LED,
];

// ---------------------------------------------------------------------------
// I²C bus (SCD30 at 0x61)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;
/// SCD30 supports up to 100 kHz.
pub const I2C_BAUDRATE_HZ: u32 = 100_000;
