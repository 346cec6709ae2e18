//! Activity LED driver.
//!
//! Single GPIO LED: on while a poll cycle is in flight, off while idle,
//! three slow blinks when the reset button wipes pairing state.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the LED GPIO via hw_init.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;
use crate::pins;

pub struct StatusLed {
    lit: bool,
}

impl Default for StatusLed {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusLed {
    pub fn new() -> Self {
        Self { lit: false }
    }

    pub fn on(&mut self) {
        hw_init::gpio_set(pins::LED_GPIO, true);
        self.lit = true;
    }

    pub fn off(&mut self) {
        hw_init::gpio_set(pins::LED_GPIO, false);
        self.lit = false;
    }

    /// Blocking blink pattern (500 ms per phase). Used on the reset path
    /// only, where blocking the loop is fine — a reset follows anyway.
    pub fn blink(&mut self, times: u32) {
        for _ in 0..times {
            self.off();
            crate::adapters::system::sleep_ms(500);
            self.on();
            crate::adapters::system::sleep_ms(500);
        }
        self.off();
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_state() {
        let mut led = StatusLed::new();
        assert!(!led.is_lit());
        led.on();
        assert!(led.is_lit());
        led.off();
        assert!(!led.is_lit());
    }
}
