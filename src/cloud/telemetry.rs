//! Telemetry message encoding.
//!
//! ```json
//! {"CO2":812.5,"Temperature":22.25,"Humidity":41.0,"MsgId":7}
//! ```
//!
//! Sent with the routing properties in [`TELEMETRY_PROPERTIES`] so IoT
//! Central / message routing can pick the right schema.

use core::fmt;

use serde::Serialize;

use super::round2;
use crate::sensors::Measurement;

/// Hard upper bound on an encoded message.
pub const MAX_MESSAGE_BYTES: usize = 256;

/// Application properties attached to every telemetry message.
pub const TELEMETRY_PROPERTIES: [(&str, &str); 4] = [
    ("appid", "co2monitor"),
    ("format", "json"),
    ("type", "telemetry"),
    ("version", "1"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryError {
    /// Encoded message exceeded [`MAX_MESSAGE_BYTES`] (carries the size).
    TooLarge(usize),
    Encode,
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge(n) => write!(f, "telemetry message too large ({} > {} bytes)", n, MAX_MESSAGE_BYTES),
            Self::Encode => write!(f, "telemetry encode failed"),
        }
    }
}

impl From<TelemetryError> for crate::error::CloudError {
    fn from(_: TelemetryError) -> Self {
        Self::Encode
    }
}

impl From<TelemetryError> for crate::error::Error {
    fn from(e: TelemetryError) -> Self {
        Self::Cloud(e.into())
    }
}

#[derive(Serialize)]
struct TelemetryMessage {
    #[serde(rename = "CO2")]
    co2: f64,
    #[serde(rename = "Temperature")]
    temperature: f64,
    #[serde(rename = "Humidity")]
    humidity: f64,
    #[serde(rename = "MsgId")]
    msg_id: u32,
}

/// Encode one telemetry message.
pub fn encode(m: &Measurement, msg_id: u32) -> Result<String, TelemetryError> {
    let msg = TelemetryMessage {
        co2: round2(m.co2_ppm),
        temperature: round2(m.temperature_c),
        humidity: round2(m.humidity_pct),
        msg_id,
    };
    let json = serde_json::to_string(&msg).map_err(|_| TelemetryError::Encode)?;
    if json.len() > MAX_MESSAGE_BYTES {
        return Err(TelemetryError::TooLarge(json.len()));
    }
    Ok(json)
}

/// Message id sequence.  Starts at 0 and is incremented before use, so the
/// first message carries id 1.
#[derive(Debug, Default)]
pub struct MessageCounter {
    last: u32,
}

impl MessageCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> u32 {
        self.last = self.last.wrapping_add(1);
        self.last
    }

    /// Id of the most recent message, 0 before the first one.
    pub fn last(&self) -> u32 {
        self.last
    }
}
