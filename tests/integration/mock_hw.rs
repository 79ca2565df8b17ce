//! Mock adapters for integration tests.
//!
//! Record every port call so tests can assert on the full history
//! without touching real GPIO, I2C or MQTT.

use co2monitor::app::events::AppEvent;
use co2monitor::app::ports::{CloudPort, EventSink, IndicatorPort, SensorPort, TimerId, TimerPort};
use co2monitor::drivers::indicator::Indicator;
use co2monitor::error::{CloudError, SensorError};
use co2monitor::sensors::Measurement;

pub fn sample(co2_ppm: f32, temperature_c: f32, humidity_pct: f32) -> Measurement {
    Measurement { co2_ppm, temperature_c, humidity_pct }
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    /// Returned by every `read_measurement` call.
    pub reading: Result<Measurement, SensorError>,
    pub levels: [bool; Indicator::COUNT],
    /// Every `set_indicator` call, in order.
    pub calls: Vec<(Indicator, bool)>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            reading: Err(SensorError::Bus),
            levels: [false; Indicator::COUNT],
            calls: Vec::new(),
        }
    }

    pub fn on(&self, which: Indicator) -> bool {
        self.levels[which as usize]
    }

    pub fn lit(&self) -> Vec<Indicator> {
        Indicator::ALL.into_iter().filter(|i| self.on(*i)).collect()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_measurement(&mut self) -> Result<Measurement, SensorError> {
        self.reading
    }
}

impl IndicatorPort for MockHardware {
    fn set_indicator(&mut self, which: Indicator, on: bool) {
        self.levels[which as usize] = on;
        self.calls.push((which, on));
    }

    fn is_indicator_on(&self, which: Indicator) -> bool {
        self.on(which)
    }
}

// ── MockCloud ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockCloud {
    pub connected: bool,
    pub network_ready: bool,
    /// When set, every send fails with this error.
    pub fail_with: Option<CloudError>,
    /// (payload, properties) per telemetry message.
    pub telemetry: Vec<(String, Vec<(String, String)>)>,
    pub reported: Vec<String>,
}

#[allow(dead_code)]
impl MockCloud {
    pub fn connected() -> Self {
        Self { connected: true, network_ready: true, ..Default::default() }
    }

    /// Reported documents parsed back to JSON.
    pub fn reported_json(&self) -> Vec<serde_json::Value> {
        self.reported
            .iter()
            .map(|d| serde_json::from_str(d).expect("reported document is JSON"))
            .collect()
    }
}

impl CloudPort for MockCloud {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn is_network_ready(&self) -> bool {
        self.network_ready
    }

    fn send_telemetry(&mut self, payload: &str, properties: &[(&str, &str)]) -> Result<(), CloudError> {
        if let Some(e) = self.fail_with {
            return Err(e);
        }
        let props = properties.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        self.telemetry.push((payload.to_string(), props));
        Ok(())
    }

    fn report_properties(&mut self, document: &str) -> Result<(), CloudError> {
        if let Some(e) = self.fail_with {
            return Err(e);
        }
        self.reported.push(document.to_string());
        Ok(())
    }
}

// ── MockTimers ────────────────────────────────────────────────

#[derive(Default)]
pub struct MockTimers {
    pub armed: Vec<(TimerId, u64)>,
    pub disarmed: Vec<TimerId>,
}

impl TimerPort for MockTimers {
    fn arm_oneshot(&mut self, id: TimerId, delay_ms: u64) {
        self.armed.push((id, delay_ms));
    }

    fn disarm(&mut self, id: TimerId) {
        self.disarmed.push(id);
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.iter().any(|e| e == event)
    }

    pub fn cloud_errors(&self) -> Vec<&'static str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::CloudError { context, .. } => Some(*context),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
