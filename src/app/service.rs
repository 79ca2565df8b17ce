//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the latest sample, the cloud setpoints and the HVAC
//! tracker.  It exposes a clean, hardware-agnostic API: every timer expiry
//! and every desired-twin patch is handed to it together with the ports it
//! may touch, making the entire service testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌────────────────────────┐ ──▶ CloudPort
//!                 │       AppService        │
//! IndicatorPort ◀─│  HVAC · CO2 alert · LED │ ──▶ EventSink
//!                 └───────────┬────────────┘
//!                             ▼
//!                         TimerPort
//! ```

use log::{debug, info, warn};

use crate::cloud::telemetry::{self, MessageCounter, TELEMETRY_PROPERTIES};
use crate::cloud::twin::{self, AckStatus, DesiredPatch, TwinProperty, TwinValue};
use crate::config::SystemConfig;
use crate::control::co2_alert;
use crate::control::hvac::{HvacState, HvacTracker};
use crate::drivers::indicator::Indicator;
use crate::drivers::led_patterns::{BlinkPattern, ConnectionStatus};
use crate::error::{CloudError, SensorError};
use crate::sensors::Measurement;

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{CloudPort, EventSink, IndicatorPort, SensorPort, TimerId, TimerPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    /// Latest valid sample; `None` before the first one and after a
    /// failed poll.
    measurement: Option<Measurement>,
    /// Setpoints, `None` until the cloud sends them.
    desired_temperature: Option<f32>,
    desired_co2_alert_level: Option<f32>,
    hvac: HvacTracker,
    /// Current level of the CO2 alert LED.
    co2_alert: bool,
    msg_ids: MessageCounter,
    buzzer_pulse_ms: u64,
    first_flash_delay_ms: u64,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Touches no hardware.  Call [`start`](Self::start) next.
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            measurement: None,
            desired_temperature: None,
            desired_co2_alert_level: None,
            hvac: HvacTracker::new(),
            co2_alert: false,
            msg_ids: MessageCounter::new(),
            buzzer_pulse_ms: u64::from(config.buzzer_pulse_ms),
            first_flash_delay_ms: u64::from(config.first_flash_delay_ms),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// All indicators off, first status blink armed.
    pub fn start(
        &mut self,
        indicators: &mut impl IndicatorPort,
        timers: &mut impl TimerPort,
        sink: &mut impl EventSink,
    ) {
        indicators.all_off();
        timers.arm_oneshot(TimerId::FlashLeds, self.first_flash_delay_ms);
        sink.emit(&AppEvent::Started);
        info!("AppService started");
    }

    // ── Timer dispatch ────────────────────────────────────────

    /// Run the handler for one expired timer.
    ///
    /// `hw` satisfies both [`SensorPort`] and [`IndicatorPort`], since one
    /// adapter owns the sensor and the indicator pins.
    pub fn handle_timer(
        &mut self,
        id: TimerId,
        hw: &mut (impl SensorPort + IndicatorPort),
        cloud: &mut impl CloudPort,
        timers: &mut impl TimerPort,
        sink: &mut impl EventSink,
    ) {
        match id {
            TimerId::MeasureSensor => self.measure(hw, cloud, sink),
            TimerId::PublishTelemetry => self.publish(cloud, sink),
            TimerId::Co2AlertCheck => self.buzzer_check(hw, timers),
            TimerId::Co2BuzzerOff => hw.set_indicator(Indicator::Co2Buzzer, false),
            TimerId::FlashLeds => self.flash(hw, cloud, timers),
            TimerId::FlashLedOff => hw.set_indicator(Indicator::CloudConnectedLed, false),
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (desired-twin patches).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        indicators: &mut impl IndicatorPort,
        cloud: &mut impl CloudPort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::ApplyDesired(patch) => self.apply_desired(patch, indicators, cloud, sink),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn measurement(&self) -> Option<Measurement> {
        self.measurement
    }

    pub fn hvac_state(&self) -> HvacState {
        self.hvac.current()
    }

    /// Level of the CO2 alert LED.
    pub fn co2_alert(&self) -> bool {
        self.co2_alert
    }

    pub fn desired_temperature(&self) -> Option<f32> {
        self.desired_temperature
    }

    pub fn desired_co2_alert_level(&self) -> Option<f32> {
        self.desired_co2_alert_level
    }

    /// Id of the last telemetry message, 0 before the first.
    pub fn last_msg_id(&self) -> u32 {
        self.msg_ids.last()
    }

    // ── Handlers ──────────────────────────────────────────────

    fn measure(
        &mut self,
        hw: &mut (impl SensorPort + IndicatorPort),
        cloud: &mut impl CloudPort,
        sink: &mut impl EventSink,
    ) {
        match hw.read_measurement() {
            Ok(m) if !m.co2_ppm.is_nan() => {
                self.measurement = Some(m);
                sink.emit(&AppEvent::Measured(m));
                self.evaluate(hw, cloud, sink);
            }
            Ok(_) => self.sensor_fault(SensorError::InvalidReading, sink),
            Err(e) => self.sensor_fault(e, sink),
        }
    }

    fn sensor_fault(&mut self, e: SensorError, sink: &mut impl EventSink) {
        self.measurement = None;
        sink.emit(&AppEvent::SensorFault(e));
    }

    fn publish(&mut self, cloud: &mut impl CloudPort, sink: &mut impl EventSink) {
        let Some(m) = self.measurement else {
            debug!("Publish skipped: no valid sample");
            return;
        };

        let msg_id = self.msg_ids.next_id();
        match telemetry::encode(&m, msg_id) {
            Ok(json) => match cloud.send_telemetry(&json, &TELEMETRY_PROPERTIES) {
                Ok(()) => sink.emit(&AppEvent::Telemetry { msg_id, measurement: m }),
                Err(error) => sink.emit(&AppEvent::CloudError { context: "telemetry", error }),
            },
            Err(e) => {
                warn!("Telemetry encode failed: {}", e);
                sink.emit(&AppEvent::CloudError { context: "telemetry", error: e.into() });
            }
        }

        report(cloud, sink, TwinProperty::ActualTemperature, TwinValue::Float(m.temperature_c));
        report(cloud, sink, TwinProperty::ActualCo2Level, TwinValue::Float(m.co2_ppm));
    }

    /// Buzzer pulse while CO2 is above the alert level.  Re-arms the
    /// pulse-off timer even when the buzzer is already sounding.
    fn buzzer_check(&mut self, indicators: &mut impl IndicatorPort, timers: &mut impl TimerPort) {
        let (Some(threshold), Some(m)) = (self.desired_co2_alert_level, self.measurement) else {
            return;
        };
        if co2_alert::is_alert(m.co2_ppm, threshold) {
            indicators.set_indicator(Indicator::Co2Buzzer, true);
            timers.arm_oneshot(TimerId::Co2BuzzerOff, self.buzzer_pulse_ms);
        }
    }

    /// Start one status blink and schedule the next.
    fn flash(
        &mut self,
        indicators: &mut impl IndicatorPort,
        cloud: &mut impl CloudPort,
        timers: &mut impl TimerPort,
    ) {
        let status = ConnectionStatus::from_flags(cloud.is_connected(), cloud.is_network_ready());
        let pattern = BlinkPattern::for_status(status);
        indicators.set_indicator(Indicator::CloudConnectedLed, true);
        timers.arm_oneshot(TimerId::FlashLeds, pattern.cycle.as_millis() as u64);
        timers.arm_oneshot(TimerId::FlashLedOff, pattern.on.as_millis() as u64);
    }

    fn apply_desired(
        &mut self,
        patch: DesiredPatch,
        indicators: &mut impl IndicatorPort,
        cloud: &mut impl CloudPort,
        sink: &mut impl EventSink,
    ) {
        if patch.is_empty() {
            debug!("Desired patch v{:?} has no known properties", patch.version);
            return;
        }

        for (property, value) in patch.values() {
            match property {
                TwinProperty::DesiredTemperature => self.desired_temperature = Some(value),
                TwinProperty::DesiredCo2AlertLevel => self.desired_co2_alert_level = Some(value),
                _ => continue,
            }
            sink.emit(&AppEvent::DesiredUpdated { property, value, version: patch.version });

            report(cloud, sink, property, TwinValue::Float(value));
            match twin::ack_document(property, TwinValue::Float(value), patch.version, AckStatus::Completed) {
                Ok(doc) => {
                    if let Err(error) = cloud.report_properties(&doc) {
                        sink.emit(&AppEvent::CloudError { context: "twin ack", error });
                    }
                }
                Err(e) => sink.emit(&AppEvent::CloudError { context: "twin ack", error: e.into() }),
            }
        }

        for property in patch.rejected() {
            let current = match property {
                TwinProperty::DesiredTemperature => self.desired_temperature,
                TwinProperty::DesiredCo2AlertLevel => self.desired_co2_alert_level,
                _ => continue,
            };
            sink.emit(&AppEvent::DesiredRejected { property, version: patch.version });
            let result = twin::rejection_document(property, current.map(TwinValue::Float), patch.version)
                .map_err(CloudError::from)
                .and_then(|doc| cloud.report_properties(&doc));
            if let Err(error) = result {
                sink.emit(&AppEvent::CloudError { context: "twin ack", error });
            }
        }

        self.evaluate(indicators, cloud, sink);
    }

    // ── Internal ──────────────────────────────────────────────

    /// Re-derive HVAC state and the alert LED from the current sample and
    /// setpoints.  Each half is skipped until its setpoint has arrived.
    fn evaluate(
        &mut self,
        indicators: &mut impl IndicatorPort,
        cloud: &mut impl CloudPort,
        sink: &mut impl EventSink,
    ) {
        let Some(m) = self.measurement else {
            return;
        };

        if let Some(desired) = self.desired_temperature {
            let from = self.hvac.current();
            let update = self.hvac.update(m.temperature_c, desired);
            if update.changed {
                sink.emit(&AppEvent::HvacChanged { from, to: update.state });
                report(
                    cloud,
                    sink,
                    TwinProperty::ActualHvacState,
                    TwinValue::Text(update.state.as_str()),
                );
            }
            indicators.set_indicator(Indicator::HvacHeatingLed, false);
            indicators.set_indicator(Indicator::HvacCoolingLed, false);
            match update.state {
                HvacState::Heating => indicators.set_indicator(Indicator::HvacHeatingLed, true),
                HvacState::Cooling => indicators.set_indicator(Indicator::HvacCoolingLed, true),
                HvacState::Off => {}
            }
        }

        if let Some(threshold) = self.desired_co2_alert_level {
            let active = co2_alert::is_alert(m.co2_ppm, threshold);
            indicators.set_indicator(Indicator::Co2AlertLed, active);
            if active != self.co2_alert {
                self.co2_alert = active;
                sink.emit(&AppEvent::Co2Alert { active, co2_ppm: m.co2_ppm });
            }
        }
    }
}

/// Send a `{"<prop>": value}` reported patch; failures become events.
fn report(
    cloud: &mut impl CloudPort,
    sink: &mut impl EventSink,
    property: TwinProperty,
    value: TwinValue,
) {
    let result = twin::reported_document(property, value)
        .map_err(CloudError::from)
        .and_then(|doc| cloud.report_properties(&doc));
    if let Err(error) = result {
        sink.emit(&AppEvent::CloudError { context: property.name(), error });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_service_has_no_state() {
        let app = AppService::new(&SystemConfig::default());
        assert_eq!(app.measurement(), None);
        assert_eq!(app.hvac_state(), HvacState::Off);
        assert!(!app.co2_alert());
        assert_eq!(app.desired_temperature(), None);
        assert_eq!(app.desired_co2_alert_level(), None);
        assert_eq!(app.last_msg_id(), 0);
    }
}
