//! Integration tests for the timer-driven AppService pipeline:
//! sensor poll → HVAC / alert evaluation → indicators, telemetry and
//! actual-value reports.

use super::mock_hw::{sample, MockCloud, MockHardware, MockTimers, RecordingSink};

use co2monitor::app::commands::AppCommand;
use co2monitor::app::events::AppEvent;
use co2monitor::app::ports::TimerId;
use co2monitor::app::service::AppService;
use co2monitor::cloud::telemetry::TELEMETRY_PROPERTIES;
use co2monitor::cloud::twin::DesiredPatch;
use co2monitor::config::SystemConfig;
use co2monitor::control::hvac::HvacState;
use co2monitor::drivers::indicator::Indicator;
use co2monitor::error::{CloudError, SensorError};
use serde_json::json;

struct Rig {
    app: AppService,
    hw: MockHardware,
    cloud: MockCloud,
    timers: MockTimers,
    sink: RecordingSink,
}

impl Rig {
    fn new() -> Self {
        Self {
            app: AppService::new(&SystemConfig::default()),
            hw: MockHardware::new(),
            cloud: MockCloud::connected(),
            timers: MockTimers::default(),
            sink: RecordingSink::default(),
        }
    }

    fn fire(&mut self, id: TimerId) {
        self.app
            .handle_timer(id, &mut self.hw, &mut self.cloud, &mut self.timers, &mut self.sink);
    }

    fn measure(&mut self, co2: f32, temperature: f32) {
        self.hw.reading = Ok(sample(co2, temperature, 45.0));
        self.fire(TimerId::MeasureSensor);
    }

    fn desire(&mut self, temperature: Option<f32>, co2_level: Option<f32>) {
        let patch = DesiredPatch {
            version: Some(1),
            desired_temperature: temperature,
            desired_co2_alert_level: co2_level,
            ..Default::default()
        };
        self.app.handle_command(
            AppCommand::ApplyDesired(patch),
            &mut self.hw,
            &mut self.cloud,
            &mut self.sink,
        );
    }
}

// ── Start-up ──────────────────────────────────────────────────

#[test]
fn start_clears_indicators_and_arms_first_flash() {
    let mut rig = Rig::new();
    rig.hw.levels = [true; Indicator::COUNT];

    rig.app.start(&mut rig.hw, &mut rig.timers, &mut rig.sink);

    assert!(rig.hw.lit().is_empty());
    assert_eq!(rig.timers.armed, vec![(TimerId::FlashLeds, 1000)]);
    assert_eq!(rig.sink.events, vec![AppEvent::Started]);
}

// ── Measurement ───────────────────────────────────────────────

#[test]
fn measurement_is_stored_without_side_effects_before_setpoints() {
    let mut rig = Rig::new();
    rig.measure(650.0, 21.0);

    assert_eq!(rig.app.measurement(), Some(sample(650.0, 21.0, 45.0)));
    assert!(rig.sink.contains(&AppEvent::Measured(sample(650.0, 21.0, 45.0))));
    assert!(rig.hw.calls.is_empty(), "no setpoint, no indicator changes");
    assert!(rig.cloud.reported.is_empty());
}

#[test]
fn read_failure_clears_the_sample() {
    let mut rig = Rig::new();
    rig.measure(650.0, 21.0);

    rig.hw.reading = Err(SensorError::Crc);
    rig.fire(TimerId::MeasureSensor);

    assert_eq!(rig.app.measurement(), None);
    assert!(rig.sink.contains(&AppEvent::SensorFault(SensorError::Crc)));
}

#[test]
fn nan_co2_counts_as_invalid() {
    let mut rig = Rig::new();
    rig.measure(f32::NAN, 21.0);

    assert_eq!(rig.app.measurement(), None);
    assert!(rig.sink.contains(&AppEvent::SensorFault(SensorError::InvalidReading)));
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn publish_without_sample_is_skipped() {
    let mut rig = Rig::new();
    rig.fire(TimerId::PublishTelemetry);

    assert!(rig.cloud.telemetry.is_empty());
    assert!(rig.cloud.reported.is_empty());
    assert_eq!(rig.app.last_msg_id(), 0);
}

#[test]
fn publish_sends_telemetry_then_actual_values() {
    let mut rig = Rig::new();
    rig.measure(812.5, 21.25);
    rig.fire(TimerId::PublishTelemetry);

    assert_eq!(rig.cloud.telemetry.len(), 1);
    let (payload, props) = &rig.cloud.telemetry[0];
    let body: serde_json::Value = serde_json::from_str(payload).unwrap();
    assert_eq!(body, json!({"CO2": 812.5, "Temperature": 21.25, "Humidity": 45.0, "MsgId": 1}));
    let expected: Vec<(String, String)> = TELEMETRY_PROPERTIES
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    assert_eq!(props, &expected);

    assert_eq!(
        rig.cloud.reported_json(),
        vec![json!({"ActualTemperature": 21.25}), json!({"ActualCO2Level": 812.5})]
    );
    assert!(rig.sink.contains(&AppEvent::Telemetry {
        msg_id: 1,
        measurement: sample(812.5, 21.25, 45.0),
    }));
}

#[test]
fn message_ids_advance_even_when_sends_fail() {
    let mut rig = Rig::new();
    rig.measure(500.0, 20.0);
    rig.fire(TimerId::PublishTelemetry);

    rig.cloud.fail_with = Some(CloudError::NotConnected);
    rig.fire(TimerId::PublishTelemetry);
    assert_eq!(rig.app.last_msg_id(), 2);
    assert_eq!(
        rig.sink.cloud_errors(),
        vec!["telemetry", "ActualTemperature", "ActualCO2Level"]
    );

    rig.cloud.fail_with = None;
    rig.fire(TimerId::PublishTelemetry);
    let body: serde_json::Value = serde_json::from_str(&rig.cloud.telemetry[1].0).unwrap();
    assert_eq!(body["MsgId"], 3);
}

// ── HVAC ──────────────────────────────────────────────────────

#[test]
fn hvac_follows_whole_degree_comparison() {
    let mut rig = Rig::new();
    rig.desire(Some(22.0), None);

    rig.measure(600.0, 20.5);
    assert_eq!(rig.app.hvac_state(), HvacState::Heating);
    assert_eq!(rig.hw.lit(), vec![Indicator::HvacHeatingLed]);
    assert!(rig.sink.contains(&AppEvent::HvacChanged { from: HvacState::Off, to: HvacState::Heating }));

    rig.measure(600.0, 23.9);
    assert_eq!(rig.app.hvac_state(), HvacState::Cooling);
    assert_eq!(rig.hw.lit(), vec![Indicator::HvacCoolingLed]);

    // 22.7 truncates to 22: on target.
    rig.measure(600.0, 22.7);
    assert_eq!(rig.app.hvac_state(), HvacState::Off);
    assert!(rig.hw.lit().is_empty());

    let states: Vec<_> = rig
        .cloud
        .reported_json()
        .into_iter()
        .filter_map(|v| v.get("ActualHvacState").cloned())
        .collect();
    assert_eq!(states, vec![json!("Heating"), json!("Cooling"), json!("Off")]);
}

#[test]
fn unchanged_hvac_state_is_not_reported_again() {
    let mut rig = Rig::new();
    rig.desire(Some(22.0), None);
    rig.measure(600.0, 20.0);
    let reports = rig.cloud.reported.len();

    rig.measure(600.0, 21.0);
    assert_eq!(rig.cloud.reported.len(), reports);
    assert_eq!(rig.hw.lit(), vec![Indicator::HvacHeatingLed]);
}

// ── CO2 alert ─────────────────────────────────────────────────

#[test]
fn alert_led_tracks_threshold() {
    let mut rig = Rig::new();
    rig.desire(None, Some(1000.0));

    rig.measure(1000.0, 21.0);
    assert!(!rig.hw.on(Indicator::Co2AlertLed), "threshold itself is not an alert");
    assert!(!rig.app.co2_alert());

    rig.measure(1200.0, 21.0);
    assert!(rig.hw.on(Indicator::Co2AlertLed));
    assert!(rig.sink.contains(&AppEvent::Co2Alert { active: true, co2_ppm: 1200.0 }));

    rig.measure(900.0, 21.0);
    assert!(!rig.hw.on(Indicator::Co2AlertLed));
    assert!(rig.sink.contains(&AppEvent::Co2Alert { active: false, co2_ppm: 900.0 }));
}

#[test]
fn buzzer_pulses_only_while_above_threshold() {
    let mut rig = Rig::new();
    rig.measure(1500.0, 21.0);

    // No threshold yet.
    rig.fire(TimerId::Co2AlertCheck);
    assert!(!rig.hw.on(Indicator::Co2Buzzer));
    assert!(rig.timers.armed.is_empty());

    rig.desire(None, Some(1000.0));
    rig.fire(TimerId::Co2AlertCheck);
    assert!(rig.hw.on(Indicator::Co2Buzzer));
    assert_eq!(rig.timers.armed, vec![(TimerId::Co2BuzzerOff, 500)]);

    rig.fire(TimerId::Co2BuzzerOff);
    assert!(!rig.hw.on(Indicator::Co2Buzzer));

    rig.measure(800.0, 21.0);
    rig.fire(TimerId::Co2AlertCheck);
    assert!(!rig.hw.on(Indicator::Co2Buzzer));
    assert_eq!(rig.timers.armed.len(), 1);
}

#[test]
fn buzzer_pulse_is_extended_while_still_sounding() {
    let mut rig = Rig::new();
    rig.desire(None, Some(1000.0));
    rig.measure(1500.0, 21.0);

    rig.fire(TimerId::Co2AlertCheck);
    rig.fire(TimerId::Co2AlertCheck);

    assert!(rig.hw.on(Indicator::Co2Buzzer));
    assert_eq!(
        rig.timers.armed,
        vec![(TimerId::Co2BuzzerOff, 500), (TimerId::Co2BuzzerOff, 500)]
    );
    assert!(rig.timers.disarmed.is_empty());
}

// ── Connection LED ────────────────────────────────────────────

#[test]
fn flash_pattern_reflects_connection_state() {
    let cases = [
        ((true, true), 1300),
        ((false, true), 100),
        ((false, false), 700),
    ];
    for ((connected, network_ready), on_ms) in cases {
        let mut rig = Rig::new();
        rig.cloud.connected = connected;
        rig.cloud.network_ready = network_ready;

        rig.fire(TimerId::FlashLeds);
        assert!(rig.hw.on(Indicator::CloudConnectedLed));
        assert_eq!(
            rig.timers.armed,
            vec![(TimerId::FlashLeds, 1400), (TimerId::FlashLedOff, on_ms)]
        );

        rig.fire(TimerId::FlashLedOff);
        assert!(!rig.hw.on(Indicator::CloudConnectedLed));
    }
}
