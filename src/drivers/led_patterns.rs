//! Connection-status blink patterns for the cloud LED.
//!
//! Every pattern has the same 1.4 s cycle; only the lit portion changes,
//! so the state can be read from across the room:
//!
//! | Status        | On      | Off     |
//! |---------------|---------|---------|
//! | Connected     | 1300 ms | 100 ms  |
//! | NetworkReady  | 100 ms  | 1300 ms |
//! | Disconnected  | 700 ms  | 700 ms  |
//!
//! The LED is driven by two one-shot timers: `FlashLeds` turns it on and
//! re-arms itself for the full cycle, `FlashLedOff` turns it off after the
//! on-time.

use core::time::Duration;

/// Full on+off cycle shared by every pattern.
pub const BLINK_CYCLE_MS: u64 = 1400;

/// Where the device currently is on the way to the cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Connected to the IoT hub.
    Connected,
    /// Network up (WiFi associated, IP acquired) but no hub session.
    NetworkReady,
    /// No network.
    Disconnected,
}

impl ConnectionStatus {
    pub fn from_flags(hub_connected: bool, network_ready: bool) -> Self {
        if hub_connected {
            Self::Connected
        } else if network_ready {
            Self::NetworkReady
        } else {
            Self::Disconnected
        }
    }
}

/// On-time and cycle length for one blink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkPattern {
    pub on: Duration,
    pub cycle: Duration,
}

impl BlinkPattern {
    pub const fn for_status(status: ConnectionStatus) -> Self {
        let on_ms = match status {
            ConnectionStatus::Connected => 1300,
            ConnectionStatus::NetworkReady => 100,
            ConnectionStatus::Disconnected => 700,
        };
        Self {
            on: Duration::from_millis(on_ms),
            cycle: Duration::from_millis(BLINK_CYCLE_MS),
        }
    }

    pub fn off(&self) -> Duration {
        self.cycle.saturating_sub(self.on)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pattern_sums_to_cycle() {
        for status in [
            ConnectionStatus::Connected,
            ConnectionStatus::NetworkReady,
            ConnectionStatus::Disconnected,
        ] {
            let p = BlinkPattern::for_status(status);
            assert_eq!(p.on + p.off(), Duration::from_millis(BLINK_CYCLE_MS));
        }
    }

    #[test]
    fn connected_is_mostly_on() {
        let p = BlinkPattern::for_status(ConnectionStatus::Connected);
        assert_eq!(p.on, Duration::from_millis(1300));
        assert_eq!(p.off(), Duration::from_millis(100));
    }

    #[test]
    fn hub_connection_takes_precedence() {
        assert_eq!(ConnectionStatus::from_flags(true, false), ConnectionStatus::Connected);
        assert_eq!(ConnectionStatus::from_flags(false, true), ConnectionStatus::NetworkReady);
        assert_eq!(ConnectionStatus::from_flags(false, false), ConnectionStatus::Disconnected);
    }
}
