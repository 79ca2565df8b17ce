//! Boolean indicator outputs (LEDs, buzzer).
//!
//! Each indicator owns one GPIO exclusively.  Boards wire some LEDs
//! active-low; the driver hides that so callers only ever say on/off.

use crate::drivers::hw_init;

/// Static description of one output pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputPin {
    pub gpio: i32,
    /// `true` when the load is lit by driving the pad low.
    pub invert: bool,
    pub name: &'static str,
}

impl OutputPin {
    pub const fn active_high(gpio: i32, name: &'static str) -> Self {
        Self { gpio, invert: false, name }
    }

    pub const fn active_low(gpio: i32, name: &'static str) -> Self {
        Self { gpio, invert: true, name }
    }

    /// Electrical level that produces the logical state `on`.
    pub const fn level_for(&self, on: bool) -> bool {
        on != self.invert
    }
}

/// Logical names of the indicators the application drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Indicator {
    HvacHeatingLed = 0,
    HvacCoolingLed = 1,
    Co2AlertLed = 2,
    Co2Buzzer = 3,
    CloudConnectedLed = 4,
}

impl Indicator {
    pub const COUNT: usize = 5;

    pub const ALL: [Indicator; Self::COUNT] = [
        Self::HvacHeatingLed,
        Self::HvacCoolingLed,
        Self::Co2AlertLed,
        Self::Co2Buzzer,
        Self::CloudConnectedLed,
    ];
}

pub struct IndicatorDriver {
    pin: OutputPin,
    on: bool,
}

impl IndicatorDriver {
    pub fn new(pin: OutputPin) -> Self {
        Self { pin, on: false }
    }

    pub fn set(&mut self, on: bool) {
        hw_init::gpio_write(self.pin.gpio, self.pin.level_for(on));
        self.on = on;
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn name(&self) -> &'static str {
        self.pin.name
    }
}
