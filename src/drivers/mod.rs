//! Board drivers: GPIO init, activity LED, reset button, watchdog.

pub mod button;
pub mod hw_init;
pub mod status_led;
pub mod watchdog;
