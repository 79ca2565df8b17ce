//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => {
                info!("START | indicators reset, status blink armed");
            }
            AppEvent::Measured(m) => {
                info!(
                    "MEAS  | CO2={:.0}ppm | T={:.2}\u{00b0}C | RH={:.1}%",
                    m.co2_ppm, m.temperature_c, m.humidity_pct,
                );
            }
            AppEvent::SensorFault(e) => {
                warn!("MEAS  | read failed: {}", e);
            }
            AppEvent::Telemetry { msg_id, measurement } => {
                info!(
                    "TELEM | id={} | CO2={:.2} T={:.2} RH={:.2}",
                    msg_id, measurement.co2_ppm, measurement.temperature_c, measurement.humidity_pct,
                );
            }
            AppEvent::HvacChanged { from, to } => {
                info!("HVAC  | {} -> {}", from, to);
            }
            AppEvent::Co2Alert { active, co2_ppm } => {
                if *active {
                    warn!("CO2   | alert raised at {:.0}ppm", co2_ppm);
                } else {
                    info!("CO2   | alert cleared at {:.0}ppm", co2_ppm);
                }
            }
            AppEvent::DesiredUpdated { property, value, version } => {
                info!("TWIN  | {}={} (v{:?})", property, value, version);
            }
            AppEvent::DesiredRejected { property, version } => {
                warn!("TWIN  | {} rejected (v{:?})", property, version);
            }
            AppEvent::CloudError { context, error } => {
                warn!("CLOUD | {} failed: {}", context, error);
            }
        }
    }
}
