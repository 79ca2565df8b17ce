//! System configuration parameters
//!
//! All tunable parameters for the CO2 monitor.  Connection settings default
//! to the `CO2MON_*` variables present at build time and can be overridden
//! by a config blob stored in NVS.

use serde::{Deserialize, Serialize};

pub type ShortString = heapless::String<64>;
pub type LongString = heapless::String<256>;

/// Cloud / network connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Provisioning scope id.  The device refuses to start without one.
    pub scope_id: ShortString,
    /// IoT Hub host, e.g. `myhub.azure-devices.net`.
    pub hub_hostname: ShortString,
    /// Device identity registered with the hub.
    pub device_id: ShortString,
    /// Pre-generated SAS token used as the MQTT password.
    pub sas_token: LongString,
    pub wifi_ssid: heapless::String<32>,
    pub wifi_password: ShortString,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            scope_id: bounded(option_env!("CO2MON_SCOPE_ID").unwrap_or("")),
            hub_hostname: bounded(option_env!("CO2MON_HUB_HOSTNAME").unwrap_or("")),
            device_id: bounded(option_env!("CO2MON_DEVICE_ID").unwrap_or("co2monitor")),
            sas_token: bounded(option_env!("CO2MON_SAS_TOKEN").unwrap_or("")),
            wifi_ssid: bounded(option_env!("CO2MON_WIFI_SSID").unwrap_or("")),
            wifi_password: bounded(option_env!("CO2MON_WIFI_PASSWORD").unwrap_or("")),
        }
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Timers ---
    /// Sensor poll period (seconds)
    pub measure_interval_secs: u32,
    /// Telemetry publish period (seconds)
    pub publish_interval_secs: u32,
    /// CO2 alert check period (seconds)
    pub co2_alert_check_secs: u32,
    /// Buzzer pulse length per qualifying alert check (milliseconds)
    pub buzzer_pulse_ms: u32,
    /// Delay before the first connection-LED flash (milliseconds)
    pub first_flash_delay_ms: u32,

    // --- SCD30 ---
    /// Sensor-internal measurement interval (seconds, 2..=1800)
    pub sensor_interval_secs: u16,
    /// Probe attempts before start-up is aborted
    pub probe_attempts: u8,
    /// Pause between failed probes (milliseconds)
    pub probe_retry_delay_ms: u32,

    // --- Cloud ---
    pub connection: ConnectionConfig,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Timers
            measure_interval_secs: 20,
            publish_interval_secs: 30,
            co2_alert_check_secs: 4,
            buzzer_pulse_ms: 500,
            first_flash_delay_ms: 1000,

            // SCD30
            sensor_interval_secs: 2,
            probe_attempts: 5,
            probe_retry_delay_ms: 1000,

            connection: ConnectionConfig::default(),
        }
    }
}

/// Range-check every field.  Returns a description of the first bad field.
pub fn validate_config(cfg: &SystemConfig) -> Result<(), &'static str> {
    if cfg.measure_interval_secs == 0 {
        return Err("measure_interval_secs must be > 0");
    }
    if cfg.publish_interval_secs == 0 {
        return Err("publish_interval_secs must be > 0");
    }
    if cfg.co2_alert_check_secs == 0 {
        return Err("co2_alert_check_secs must be > 0");
    }
    if cfg.buzzer_pulse_ms == 0 {
        return Err("buzzer_pulse_ms must be > 0");
    }
    if !(2..=1800).contains(&cfg.sensor_interval_secs) {
        return Err("sensor_interval_secs must be 2–1800");
    }
    if cfg.probe_attempts == 0 {
        return Err("probe_attempts must be > 0");
    }
    Ok(())
}

/// Check the connection settings the device cannot start without.
pub fn validate_connection(conn: &ConnectionConfig) -> Result<(), &'static str> {
    if conn.scope_id.trim().is_empty() {
        return Err("scope_id is not configured");
    }
    Ok(())
}

/// Copy `s` into a bounded string, truncating at capacity.
pub fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for ch in s.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}
