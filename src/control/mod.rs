//! Setpoint comparisons: HVAC state and CO2 alert level.

pub mod co2_alert;
pub mod hvac;
