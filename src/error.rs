//! Unified error types for the CO2 monitor firmware.
//!
//! Every subsystem has its own small `Copy` error enum; all of them fold
//! into [`Error`] so the top-level loop can handle failures uniformly.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The CO2 sensor could not be reached or returned bad data.
    Sensor(SensorError),
    /// A cloud send / report failed.
    Cloud(CloudError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Cloud(e) => write!(f, "cloud: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The sensor never answered the probe within the retry budget.
    ProbeFailed,
    /// An I2C transaction with the sensor failed.
    Bus,
    /// A data word failed its CRC-8 check.
    Crc,
    /// The sensor returned a NaN CO2 value.
    InvalidReading,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProbeFailed => write!(f, "SCD30 probe failed"),
            Self::Bus => write!(f, "I2C transaction failed"),
            Self::Crc => write!(f, "CRC mismatch"),
            Self::InvalidReading => write!(f, "invalid reading"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Cloud errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudError {
    /// The hub connection is not up.
    NotConnected,
    /// The payload could not be serialised or was too large.
    Encode,
    /// The MQTT client refused the publish.
    PublishFailed,
    /// An inbound twin document could not be understood.
    Malformed,
}

impl fmt::Display for CloudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected to IoT Hub"),
            Self::Encode => write!(f, "payload encode failed"),
            Self::PublishFailed => write!(f, "MQTT publish failed"),
            Self::Malformed => write!(f, "malformed twin document"),
        }
    }
}

impl From<CloudError> for Error {
    fn from(e: CloudError) -> Self {
        Self::Cloud(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
