//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::cloud::twin::TwinProperty;
use crate::control::hvac::HvacState;
use crate::error::{CloudError, SensorError};
use crate::sensors::Measurement;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Indicators reset and the first status blink armed.
    Started,

    /// A valid sample was stored.
    Measured(Measurement),

    /// The poll failed; the stored sample was cleared.
    SensorFault(SensorError),

    /// A telemetry message went out.
    Telemetry { msg_id: u32, measurement: Measurement },

    /// The derived HVAC state changed.
    HvacChanged { from: HvacState, to: HvacState },

    /// CO2 crossed the alert level in either direction.
    Co2Alert { active: bool, co2_ppm: f32 },

    /// A desired property arrived from the cloud.
    DesiredUpdated { property: TwinProperty, value: f32, version: Option<u32> },

    /// A desired property carried an unusable value and was acked as
    /// invalid.  The previous setpoint stays in force.
    DesiredRejected { property: TwinProperty, version: Option<u32> },

    /// A cloud send failed.  Not retried.
    CloudError { context: &'static str, error: CloudError },
}
