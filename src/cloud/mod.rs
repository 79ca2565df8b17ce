//! Cloud payloads: telemetry messages, device-twin documents, and the
//! inbox that carries desired-property patches to the main loop.
//!
//! Everything here is transport-agnostic; topics and the MQTT client live
//! in [`adapters::iot_hub`](crate::adapters::iot_hub).

pub mod inbox;
pub mod telemetry;
pub mod twin;

/// Round to two decimals for the wire.
///
/// Goes through `f64` so `812.3f32` prints as `812.3`, not
/// `812.2999877929688`.
pub(crate) fn round2(v: f32) -> f64 {
    (f64::from(v) * 100.0).round() / 100.0
}
