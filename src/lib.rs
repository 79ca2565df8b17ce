//! CO2 monitor firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod cloud;
pub mod config;
pub mod control;
pub mod error;
pub mod events;
pub mod pins;
pub mod scheduler;
pub mod termination;

// Hardware-facing layers.  Each module carries its own host simulation
// behind cfg attributes, so the crate builds and tests off-target.
pub mod adapters;
pub mod drivers;
pub mod sensors;

pub use error::{Error, Result};
