//! One-shot GPIO initialisation and raw level writes.
//!
//! Configures every indicator pin as a push-pull output driven to its
//! inactive level, using raw ESP-IDF sys calls.  Called once from `main()`
//! before the event loop starts.
//!
//! On host targets the levels are recorded in an atomic table so tests can
//! observe what would have been written to the pads.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, Ordering};

use log::info;

use crate::drivers::indicator::OutputPin;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed { gpio: i32, rc: i32 },
    I2cInitFailed,
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed { gpio, rc } => {
                write!(f, "GPIO{} config failed (rc={})", gpio, rc)
            }
            Self::I2cInitFailed => write!(f, "I2C master init failed"),
        }
    }
}

impl From<HwInitError> for crate::error::Error {
    fn from(e: HwInitError) -> Self {
        match e {
            HwInitError::GpioConfigFailed { .. } => Self::Init("GPIO output config failed"),
            HwInitError::I2cInitFailed => Self::Init("I2C master init failed"),
        }
    }
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn init_gpio_outputs(pins: &[OutputPin]) -> Result<(), HwInitError> {
    for pin in pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin.gpio,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        // SAFETY: called once from main() before the event loop; the
        // config struct outlives the call.
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed { gpio: pin.gpio, rc: ret });
        }
        gpio_write(pin.gpio, pin.level_for(false));
    }
    info!("hw_init: {} GPIO outputs configured", pins.len());
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_gpio_outputs(pins: &[OutputPin]) -> Result<(), HwInitError> {
    for pin in pins {
        gpio_write(pin.gpio, pin.level_for(false));
    }
    info!("hw_init(sim): {} GPIO outputs configured", pins.len());
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an already-configured output pin;
    // main-loop only.
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

/// GPIO0-39 on the classic ESP32.
#[cfg(not(target_os = "espidf"))]
const SIM_GPIO_COUNT: usize = 40;

#[cfg(not(target_os = "espidf"))]
static SIM_LEVELS: [AtomicBool; SIM_GPIO_COUNT] = [const { AtomicBool::new(false) }; SIM_GPIO_COUNT];

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) {
    if let Some(level) = usize::try_from(pin).ok().and_then(|i| SIM_LEVELS.get(i)) {
        level.store(high, Ordering::Relaxed);
    }
}

/// Last level written to `pin` (host simulation only).
#[cfg(not(target_os = "espidf"))]
pub fn sim_level(pin: i32) -> bool {
    usize::try_from(pin)
        .ok()
        .and_then(|i| SIM_LEVELS.get(i))
        .is_some_and(|level| level.load(Ordering::Relaxed))
}
