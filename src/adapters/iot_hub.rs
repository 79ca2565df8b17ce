//! Azure IoT Hub over MQTT.
//!
//! The topic and credential builders plus inbound routing are pure and
//! build on every target.  [`IotHubClient`] (espidf only) implements
//! [`CloudPort`](crate::app::ports::CloudPort) on top of the
//! `esp-idf-svc` MQTT client.
//!
//! ```text
//!  telemetry ──▶ devices/{id}/messages/events/{props}
//!  reported  ──▶ $iothub/twin/PATCH/properties/reported/?$rid={n}
//!  twin GET  ──▶ $iothub/twin/GET/?$rid={n}
//!  desired   ◀── $iothub/twin/PATCH/properties/desired/?$version={v}
//!  responses ◀── $iothub/twin/res/{status}/?$rid={n}
//! ```
//!
//! Inbound desired properties never touch the application directly: the
//! MQTT callback parses them and hands a [`DesiredPatch`] to the
//! [`inbox`](crate::cloud::inbox), which the main loop drains.

use core::fmt::Write as _;

use log::{debug, warn};

use crate::cloud::twin::{self, DesiredPatch};

pub const MQTT_PORT: u16 = 8883;
pub const API_VERSION: &str = "2021-04-12";

pub const DESIRED_PATCH_SUBSCRIPTION: &str = "$iothub/twin/PATCH/properties/desired/#";
pub const TWIN_RESPONSE_SUBSCRIPTION: &str = "$iothub/twin/res/#";

const DESIRED_PATCH_PREFIX: &str = "$iothub/twin/PATCH/properties/desired/";
const TWIN_RESPONSE_PREFIX: &str = "$iothub/twin/res/";

/// System properties marking the body as UTF-8 JSON for message routing.
const SYSTEM_PROPERTIES: &str = "$.ct=application%2Fjson&$.ce=utf-8";

// ── Credentials ───────────────────────────────────────────────

pub fn broker_url(hub_hostname: &str) -> String {
    format!("mqtts://{}:{}", hub_hostname, MQTT_PORT)
}

pub fn mqtt_username(hub_hostname: &str, device_id: &str) -> String {
    format!("{}/{}/?api-version={}", hub_hostname, device_id, API_VERSION)
}

// ── Topics ────────────────────────────────────────────────────

/// Device-to-cloud topic with the application properties appended as a
/// URL-encoded property bag.
pub fn telemetry_topic(device_id: &str, properties: &[(&str, &str)]) -> String {
    let mut topic = format!("devices/{}/messages/events/{}", device_id, SYSTEM_PROPERTIES);
    for (key, value) in properties {
        topic.push('&');
        url_encode_into(&mut topic, key);
        topic.push('=');
        url_encode_into(&mut topic, value);
    }
    topic
}

pub fn reported_topic(rid: u32) -> String {
    format!("$iothub/twin/PATCH/properties/reported/?$rid={}", rid)
}

pub fn twin_get_topic(rid: u32) -> String {
    format!("$iothub/twin/GET/?$rid={}", rid)
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
pub fn url_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    url_encode_into(&mut out, s);
    out
}

fn url_encode_into(out: &mut String, s: &str) {
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(b as char);
        } else {
            // Writing to a String cannot fail.
            let _ = write!(out, "%{:02X}", b);
        }
    }
}

// ── Inbound routing ───────────────────────────────────────────

/// What an inbound publish is, judged by its topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundTopic {
    DesiredPatch,
    TwinResponse { status: u16 },
    Other,
}

pub fn classify_topic(topic: &str) -> InboundTopic {
    if topic.starts_with(DESIRED_PATCH_PREFIX) {
        return InboundTopic::DesiredPatch;
    }
    if let Some(rest) = topic.strip_prefix(TWIN_RESPONSE_PREFIX) {
        let status = rest.split('/').next().and_then(|s| s.parse().ok());
        return match status {
            Some(status) => InboundTopic::TwinResponse { status },
            None => InboundTopic::Other,
        };
    }
    InboundTopic::Other
}

/// Turn an inbound publish into a desired patch for the inbox.
///
/// Desired-property patches and successful full-twin responses (status
/// 200) yield a patch.  Acks for reported patches (204) and anything
/// unparseable yield `None`.
pub fn route_inbound(topic: &str, payload: &[u8]) -> Option<DesiredPatch> {
    match classify_topic(topic) {
        InboundTopic::DesiredPatch | InboundTopic::TwinResponse { status: 200 } => {
            match twin::parse_desired(payload) {
                Ok(patch) => Some(patch),
                Err(e) => {
                    warn!("IoT Hub: dropping twin document: {}", e);
                    None
                }
            }
        }
        InboundTopic::TwinResponse { status } if status >= 300 => {
            warn!("IoT Hub: twin request failed with status {}", status);
            None
        }
        InboundTopic::TwinResponse { .. } => None,
        InboundTopic::Other => {
            debug!("IoT Hub: ignoring publish on {}", topic);
            None
        }
    }
}

// ── Device client ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use client::IotHubClient;

#[cfg(target_os = "espidf")]
mod client {
    use core::sync::atomic::{AtomicBool, Ordering};

    use esp_idf_svc::mqtt::client::{
        Details, EspMqttClient, EventPayload, MqttClientConfiguration, QoS,
    };
    use log::{info, warn};

    use super::*;
    use crate::app::ports::CloudPort;
    use crate::cloud::inbox;
    use crate::config::{ConnectionConfig, ShortString};
    use crate::error::{CloudError, Error, Result};

    static CONNECTED: AtomicBool = AtomicBool::new(false);
    /// Set on every (re)connect; subscriptions and the twin GET follow.
    static NEEDS_SUBSCRIBE: AtomicBool = AtomicBool::new(false);

    pub struct IotHubClient {
        mqtt: EspMqttClient<'static>,
        device_id: ShortString,
        rid: u32,
        network_ready: bool,
    }

    impl IotHubClient {
        /// Create the MQTT client.  The connection itself is established
        /// in the background once the network is up.
        pub fn new(conn: &ConnectionConfig) -> Result<Self> {
            let url = broker_url(&conn.hub_hostname);
            let username = mqtt_username(&conn.hub_hostname, &conn.device_id);
            let mqtt_config = MqttClientConfiguration {
                client_id: Some(conn.device_id.as_str()),
                username: Some(username.as_str()),
                password: Some(conn.sas_token.as_str()),
                crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
                ..Default::default()
            };

            let mqtt = EspMqttClient::new_cb(&url, &mqtt_config, |event| match event.payload() {
                EventPayload::Connected(_) => {
                    info!("IoT Hub: connected");
                    CONNECTED.store(true, Ordering::Release);
                    NEEDS_SUBSCRIBE.store(true, Ordering::Release);
                }
                EventPayload::Disconnected => {
                    warn!("IoT Hub: disconnected");
                    CONNECTED.store(false, Ordering::Release);
                }
                EventPayload::Received { topic, data, details, .. } => {
                    if !matches!(details, Details::Complete) {
                        warn!("IoT Hub: chunked publish ignored");
                        return;
                    }
                    if let Some(patch) = topic.and_then(|t| route_inbound(t, data)) {
                        inbox::deliver(patch);
                    }
                }
                EventPayload::Error(e) => warn!("IoT Hub: MQTT error {:?}", e),
                _ => {}
            })
            .map_err(|_| Error::Init("MQTT client"))?;

            info!("IoT Hub: client created for {}", conn.hub_hostname);
            Ok(Self {
                mqtt,
                device_id: conn.device_id.clone(),
                rid: 0,
                network_ready: false,
            })
        }

        pub fn set_network_ready(&mut self, ready: bool) {
            self.network_ready = ready;
        }

        /// Subscribe and request the full twin after each (re)connect.
        pub fn poll(&mut self) {
            if !NEEDS_SUBSCRIBE.swap(false, Ordering::AcqRel) {
                return;
            }
            for topic in [DESIRED_PATCH_SUBSCRIPTION, TWIN_RESPONSE_SUBSCRIPTION] {
                if let Err(e) = self.mqtt.subscribe(topic, QoS::AtMostOnce) {
                    warn!("IoT Hub: subscribe {} failed: {}", topic, e);
                    NEEDS_SUBSCRIBE.store(true, Ordering::Release);
                    return;
                }
            }
            let rid = self.next_rid();
            if let Err(e) = self.mqtt.enqueue(&twin_get_topic(rid), QoS::AtMostOnce, false, &[]) {
                warn!("IoT Hub: twin GET failed: {}", e);
            }
        }

        fn next_rid(&mut self) -> u32 {
            self.rid = self.rid.wrapping_add(1);
            self.rid
        }

        fn publish(&mut self, topic: &str, payload: &[u8]) -> core::result::Result<(), CloudError> {
            if !self.is_connected() {
                return Err(CloudError::NotConnected);
            }
            self.mqtt
                .enqueue(topic, QoS::AtLeastOnce, false, payload)
                .map(|_| ())
                .map_err(|_| CloudError::PublishFailed)
        }
    }

    impl CloudPort for IotHubClient {
        fn is_connected(&self) -> bool {
            CONNECTED.load(Ordering::Acquire)
        }

        fn is_network_ready(&self) -> bool {
            self.network_ready
        }

        fn send_telemetry(
            &mut self,
            payload: &str,
            properties: &[(&str, &str)],
        ) -> core::result::Result<(), CloudError> {
            let topic = telemetry_topic(&self.device_id, properties);
            self.publish(&topic, payload.as_bytes())
        }

        fn report_properties(&mut self, document: &str) -> core::result::Result<(), CloudError> {
            let rid = self.next_rid();
            self.publish(&reported_topic(rid), document.as_bytes())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::telemetry::TELEMETRY_PROPERTIES;

    #[test]
    fn credentials() {
        assert_eq!(broker_url("hub.azure-devices.net"), "mqtts://hub.azure-devices.net:8883");
        assert_eq!(
            mqtt_username("hub.azure-devices.net", "co2-1"),
            "hub.azure-devices.net/co2-1/?api-version=2021-04-12"
        );
    }

    #[test]
    fn telemetry_topic_carries_properties() {
        assert_eq!(
            telemetry_topic("co2-1", &TELEMETRY_PROPERTIES),
            "devices/co2-1/messages/events/$.ct=application%2Fjson&$.ce=utf-8\
             &appid=co2monitor&format=json&type=telemetry&version=1"
        );
    }

    #[test]
    fn property_values_are_encoded() {
        assert_eq!(url_encode("a b&c=d/é"), "a%20b%26c%3Dd%2F%C3%A9");
        assert_eq!(url_encode("Safe-_.~09"), "Safe-_.~09");
        let topic = telemetry_topic("d", &[("room", "lab 2")]);
        assert!(topic.ends_with("&room=lab%202"));
    }

    #[test]
    fn request_topics() {
        assert_eq!(reported_topic(7), "$iothub/twin/PATCH/properties/reported/?$rid=7");
        assert_eq!(twin_get_topic(1), "$iothub/twin/GET/?$rid=1");
    }

    #[test]
    fn classifies_inbound_topics() {
        assert_eq!(
            classify_topic("$iothub/twin/PATCH/properties/desired/?$version=4"),
            InboundTopic::DesiredPatch
        );
        assert_eq!(
            classify_topic("$iothub/twin/res/200/?$rid=1"),
            InboundTopic::TwinResponse { status: 200 }
        );
        assert_eq!(
            classify_topic("$iothub/twin/res/204/?$rid=2&$version=5"),
            InboundTopic::TwinResponse { status: 204 }
        );
        assert_eq!(classify_topic("$iothub/twin/res/abc/"), InboundTopic::Other);
        assert_eq!(classify_topic("devices/x/messages/devicebound/"), InboundTopic::Other);
    }

    #[test]
    fn routes_desired_patch() {
        let patch = route_inbound(
            "$iothub/twin/PATCH/properties/desired/?$version=4",
            br#"{"DesiredTemperature":21.5,"$version":4}"#,
        )
        .unwrap();
        assert_eq!(patch.desired_temperature, Some(21.5));
        assert_eq!(patch.version, Some(4));
    }

    #[test]
    fn routes_full_twin_response() {
        let body = br#"{"desired":{"DesiredCO2AlertLevel":1000,"$version":9},"reported":{}}"#;
        let patch = route_inbound("$iothub/twin/res/200/?$rid=1", body).unwrap();
        assert_eq!(patch.desired_co2_alert_level, Some(1000.0));
        assert_eq!(patch.version, Some(9));
    }

    #[test]
    fn ignores_acks_errors_and_garbage() {
        assert_eq!(route_inbound("$iothub/twin/res/204/?$rid=2", b""), None);
        assert_eq!(route_inbound("$iothub/twin/res/429/?$rid=3", b"{}"), None);
        assert_eq!(route_inbound("$iothub/twin/PATCH/properties/desired/", b"not json"), None);
        assert_eq!(route_inbound("elsewhere", b"{}"), None);
    }
}
