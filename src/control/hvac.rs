//! HVAC state derived from the current temperature and the desired setpoint.
//!
//! Both temperatures are truncated toward zero to whole degrees before they
//! are compared, so 21.9 °C against a 21.0 °C setpoint reads as `Off`.  The
//! dashboard and the LEDs have always worked in whole degrees; keep it that
//! way unless both sides change together.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HvacState {
    Heating,
    Cooling,
    #[default]
    Off,
}

impl HvacState {
    /// Twin string value for `ActualHvacState`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Heating => "Heating",
            Self::Cooling => "Cooling",
            Self::Off => "Off",
        }
    }
}

impl fmt::Display for HvacState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify `actual_c` against `desired_c`.
pub fn classify(actual_c: f32, desired_c: f32) -> HvacState {
    let actual = actual_c as i32;
    let desired = desired_c as i32;
    if actual == desired {
        HvacState::Off
    } else if actual > desired {
        HvacState::Cooling
    } else {
        HvacState::Heating
    }
}

/// Result of feeding one sample through [`HvacTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HvacUpdate {
    pub state: HvacState,
    /// `true` when `state` differs from the previous sample.
    pub changed: bool,
}

/// Remembers the last reported state so unchanged states aren't re-sent.
#[derive(Debug, Default)]
pub struct HvacTracker {
    previous: HvacState,
}

impl HvacTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, actual_c: f32, desired_c: f32) -> HvacUpdate {
        let state = classify(actual_c, desired_c);
        let changed = state != self.previous;
        self.previous = state;
        HvacUpdate { state, changed }
    }

    pub fn current(&self) -> HvacState {
        self.previous
    }
}
