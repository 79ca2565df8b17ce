//! Fuzz target: `iot_hub::route_inbound`
//!
//! The first byte picks where the topic ends; the rest is split into an
//! arbitrary topic and payload, as the MQTT callback would see them.
//!
//! cargo fuzz run fuzz_inbound_publish

#![no_main]

use co2monitor::adapters::iot_hub::route_inbound;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let (topic, payload) = rest.split_at(usize::from(split).min(rest.len()));
    if let Ok(topic) = core::str::from_utf8(topic) {
        let _ = route_inbound(topic, payload);
    }
});
