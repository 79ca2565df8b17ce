//! Integration tests for the device-twin path: inbound MQTT publish →
//! inbox → AppService → echo / ack reports and re-evaluated indicators.

use super::mock_hw::{sample, MockCloud, MockHardware, MockTimers, RecordingSink};

use co2monitor::adapters::iot_hub;
use co2monitor::app::commands::AppCommand;
use co2monitor::app::events::AppEvent;
use co2monitor::app::ports::TimerId;
use co2monitor::app::service::AppService;
use co2monitor::cloud::inbox;
use co2monitor::cloud::twin::{parse_desired, TwinProperty};
use co2monitor::config::SystemConfig;
use co2monitor::drivers::indicator::Indicator;
use co2monitor::error::CloudError;
use serde_json::json;

fn apply(
    app: &mut AppService,
    payload: &[u8],
    hw: &mut MockHardware,
    cloud: &mut MockCloud,
    sink: &mut RecordingSink,
) {
    let patch = parse_desired(payload).expect("valid twin document");
    app.handle_command(AppCommand::ApplyDesired(patch), hw, cloud, sink);
}

#[test]
fn desired_values_are_stored_echoed_and_acked() {
    let mut app = AppService::new(&SystemConfig::default());
    let (mut hw, mut cloud, mut sink) = (MockHardware::new(), MockCloud::connected(), RecordingSink::default());

    apply(
        &mut app,
        br#"{"DesiredTemperature": 21.5, "DesiredCO2AlertLevel": 1000, "$version": 4}"#,
        &mut hw,
        &mut cloud,
        &mut sink,
    );

    assert_eq!(app.desired_temperature(), Some(21.5));
    assert_eq!(app.desired_co2_alert_level(), Some(1000.0));
    assert_eq!(
        cloud.reported_json(),
        vec![
            json!({"DesiredTemperature": 21.5}),
            json!({"DesiredTemperature": {"value": 21.5, "ac": 200, "av": 4, "ad": "completed"}}),
            json!({"DesiredCO2AlertLevel": 1000.0}),
            json!({"DesiredCO2AlertLevel": {"value": 1000.0, "ac": 200, "av": 4, "ad": "completed"}}),
        ]
    );
    assert!(sink.contains(&AppEvent::DesiredUpdated {
        property: TwinProperty::DesiredTemperature,
        value: 21.5,
        version: Some(4),
    }));
}

#[test]
fn patch_without_known_properties_changes_nothing() {
    let mut app = AppService::new(&SystemConfig::default());
    let (mut hw, mut cloud, mut sink) = (MockHardware::new(), MockCloud::connected(), RecordingSink::default());

    apply(&mut app, br#"{"Fan": "on", "$version": 2}"#, &mut hw, &mut cloud, &mut sink);

    assert_eq!(app.desired_temperature(), None);
    assert!(cloud.reported.is_empty());
    assert!(sink.events.is_empty());
}

#[test]
fn new_setpoint_reevaluates_the_current_sample() {
    let mut app = AppService::new(&SystemConfig::default());
    let (mut hw, mut cloud, mut timers, mut sink) =
        (MockHardware::new(), MockCloud::connected(), MockTimers::default(), RecordingSink::default());

    hw.reading = Ok(sample(1400.0, 25.2, 50.0));
    app.handle_timer(TimerId::MeasureSensor, &mut hw, &mut cloud, &mut timers, &mut sink);
    assert!(hw.lit().is_empty());

    apply(
        &mut app,
        br#"{"DesiredTemperature": 22, "DesiredCO2AlertLevel": 1200}"#,
        &mut hw,
        &mut cloud,
        &mut sink,
    );

    assert_eq!(hw.lit(), vec![Indicator::HvacCoolingLed, Indicator::Co2AlertLed]);
    assert!(cloud.reported_json().contains(&json!({"ActualHvacState": "Cooling"})));

    // No `$version`: acks carry no `av`.
    let ack = &cloud.reported_json()[1];
    assert!(ack["DesiredTemperature"].get("av").is_none());
}

#[test]
fn report_failures_do_not_block_the_update() {
    let mut app = AppService::new(&SystemConfig::default());
    let mut cloud = MockCloud { fail_with: Some(CloudError::NotConnected), ..Default::default() };
    let (mut hw, mut sink) = (MockHardware::new(), RecordingSink::default());

    apply(&mut app, br#"{"DesiredCO2AlertLevel": 800}"#, &mut hw, &mut cloud, &mut sink);

    assert_eq!(app.desired_co2_alert_level(), Some(800.0));
    assert_eq!(sink.cloud_errors(), vec!["DesiredCO2AlertLevel", "twin ack"]);
}

#[test]
fn unusable_desired_value_is_acked_invalid_and_ignored() {
    let mut app = AppService::new(&SystemConfig::default());
    let (mut hw, mut cloud, mut sink) = (MockHardware::new(), MockCloud::connected(), RecordingSink::default());
    apply(&mut app, br#"{"DesiredTemperature": 21.5, "$version": 2}"#, &mut hw, &mut cloud, &mut sink);
    cloud.reported.clear();

    apply(
        &mut app,
        br#"{"DesiredTemperature": 1e39, "DesiredCO2AlertLevel": 900, "$version": 3}"#,
        &mut hw,
        &mut cloud,
        &mut sink,
    );

    assert_eq!(app.desired_temperature(), Some(21.5));
    assert_eq!(app.desired_co2_alert_level(), Some(900.0));
    assert_eq!(
        cloud.reported_json(),
        vec![
            json!({"DesiredCO2AlertLevel": 900.0}),
            json!({"DesiredCO2AlertLevel": {"value": 900.0, "ac": 200, "av": 3, "ad": "completed"}}),
            json!({"DesiredTemperature": {"value": 21.5, "ac": 404, "av": 3, "ad": "invalid"}}),
        ]
    );
    assert!(sink.contains(&AppEvent::DesiredRejected {
        property: TwinProperty::DesiredTemperature,
        version: Some(3),
    }));
}

#[test]
fn rejection_without_prior_setpoint_omits_the_value() {
    let mut app = AppService::new(&SystemConfig::default());
    let (mut hw, mut cloud, mut sink) = (MockHardware::new(), MockCloud::connected(), RecordingSink::default());

    apply(&mut app, br#"{"DesiredCO2AlertLevel": "high"}"#, &mut hw, &mut cloud, &mut sink);

    assert_eq!(app.desired_co2_alert_level(), None);
    assert_eq!(
        cloud.reported_json(),
        vec![json!({"DesiredCO2AlertLevel": {"ac": 404, "ad": "invalid"}})]
    );
}

// The only test here that touches the process-wide inbox.
#[test]
fn mqtt_publishes_reach_the_service_through_the_inbox() {
    let mut app = AppService::new(&SystemConfig::default());
    let (mut hw, mut cloud, mut sink) = (MockHardware::new(), MockCloud::connected(), RecordingSink::default());

    let full_twin = br#"{"desired": {"DesiredTemperature": 20, "$version": 7}, "reported": {}}"#;
    let patch = br#"{"DesiredCO2AlertLevel": 950, "$version": 8}"#;
    let inbound: [(&str, &[u8]); 3] = [
        ("$iothub/twin/res/200/?$rid=1", full_twin),
        ("$iothub/twin/res/204/?$rid=2&$version=7", b""),
        ("$iothub/twin/PATCH/properties/desired/?$version=8", patch),
    ];
    for (topic, payload) in inbound {
        if let Some(p) = iot_hub::route_inbound(topic, payload) {
            assert!(inbox::deliver(p));
        }
    }

    let mut versions = Vec::new();
    inbox::drain(|p| {
        versions.push(p.version);
        app.handle_command(AppCommand::ApplyDesired(p), &mut hw, &mut cloud, &mut sink);
    });

    assert_eq!(versions, vec![Some(7), Some(8)]);
    assert_eq!(app.desired_temperature(), Some(20.0));
    assert_eq!(app.desired_co2_alert_level(), Some(950.0));
}
