//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensor, indicators, cloud, timers, event sinks, storage)
//! implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! or the network directly.

use crate::config::SystemConfig;
use crate::drivers::indicator::Indicator;
use crate::error::{CloudError, SensorError};
use crate::sensors::Measurement;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain a CO2 sample.
pub trait SensorPort {
    /// Latest CO2 / temperature / humidity sample.
    fn read_measurement(&mut self) -> Result<Measurement, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Indicator port (driven adapter: domain → GPIO)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the LEDs and buzzer.
pub trait IndicatorPort {
    fn set_indicator(&mut self, which: Indicator, on: bool);

    fn is_indicator_on(&self, which: Indicator) -> bool;

    /// Switch every indicator off.
    fn all_off(&mut self) {
        for which in Indicator::ALL {
            self.set_indicator(which, false);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Cloud port (driven adapter: domain ↔ IoT Hub)
// ───────────────────────────────────────────────────────────────

/// Outbound device-to-cloud traffic plus the connection flags the status
/// LED reflects.
pub trait CloudPort {
    /// Hub session is up.
    fn is_connected(&self) -> bool;

    /// Network is up, whether or not the hub session is.
    fn is_network_ready(&self) -> bool;

    /// Publish a telemetry message with application routing properties.
    fn send_telemetry(&mut self, payload: &str, properties: &[(&str, &str)])
        -> Result<(), CloudError>;

    /// Publish a reported-properties patch (a JSON object).
    fn report_properties(&mut self, document: &str) -> Result<(), CloudError>;
}

// ───────────────────────────────────────────────────────────────
// Timer port (driven adapter: domain → TimerSet)
// ───────────────────────────────────────────────────────────────

/// Identifies one timer in the [`TimerSet`](crate::scheduler::TimerSet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TimerId {
    /// Periodic: poll the SCD30.
    MeasureSensor = 0,
    /// Periodic: send telemetry and actual-value twins.
    PublishTelemetry = 1,
    /// Periodic: sound the buzzer while CO2 is above the alert level.
    Co2AlertCheck = 2,
    /// One-shot: end of a buzzer pulse.
    Co2BuzzerOff = 3,
    /// One-shot, self re-arming: start of a status LED blink.
    FlashLeds = 4,
    /// One-shot: end of the lit part of a status LED blink.
    FlashLedOff = 5,
}

impl TimerId {
    pub const COUNT: usize = 6;

    pub const ALL: [TimerId; Self::COUNT] = [
        Self::MeasureSensor,
        Self::PublishTelemetry,
        Self::Co2AlertCheck,
        Self::Co2BuzzerOff,
        Self::FlashLeds,
        Self::FlashLedOff,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }
}

/// Lets the domain (re)arm the one-shot timers it owns.
pub trait TimerPort {
    /// Fire `id` once, `delay_ms` from now.  Replaces a pending deadline.
    fn arm_oneshot(&mut self, id: TimerId, delay_ms: u64);

    /// Cancel a pending deadline.  No-op when nothing is pending.
    fn disarm(&mut self, id: TimerId);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST run [`validate_config`](crate::config::validate_config)
/// before persisting and reject, not clamp, bad values.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Timer delegate (decouples the timer set from the event queue)
// ───────────────────────────────────────────────────────────────

/// Callback the [`TimerSet`](crate::scheduler::TimerSet) invokes when a
/// deadline passes.
///
/// The main loop implements this by forwarding to
/// [`push_event`](crate::events::push_event); the timer set itself knows
/// nothing about events or queues.
pub trait TimerDelegate {
    fn on_timer_fired(&mut self, id: TimerId);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::Corrupted => Self::Config("stored config corrupted"),
            ConfigError::IoError => Self::Config("config storage I/O error"),
        }
    }
}
