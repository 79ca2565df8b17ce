//! Indicator drivers, GPIO initialisation, and the task watchdog.

pub mod hw_init;
pub mod indicator;
pub mod led_patterns;
pub mod watchdog;
