//! Fuzz target: `twin::parse_desired`
//!
//! Drives arbitrary bytes into the desired-properties parser and asserts
//! that it never panics and that every parsed value, accepted or refused,
//! can always be acked.
//!
//! cargo fuzz run fuzz_twin_patch

#![no_main]

use co2monitor::cloud::twin::{ack_document, parse_desired, rejection_document, AckStatus, TwinValue};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(patch) = parse_desired(data) else {
        return;
    };
    for (property, value) in patch.values() {
        assert!(value.is_finite(), "{} accepted a non-finite value", property);
        let ack = ack_document(property, TwinValue::Float(value), patch.version, AckStatus::Completed);
        assert!(ack.is_ok(), "ack for {} failed", property);
    }
    for property in patch.rejected() {
        assert!(rejection_document(property, None, patch.version).is_ok());
    }
});
