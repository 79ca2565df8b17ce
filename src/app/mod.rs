//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for the CO2 monitor: sample
//! bookkeeping, HVAC and CO2 alert evaluation, telemetry and twin
//! reporting, and the status blink.  All interaction with hardware and the
//! cloud happens through **port traits** defined in [`ports`], keeping this
//! layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
