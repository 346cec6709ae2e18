//! ISR-debounced WiFi reset button.
//!
//! ## Hardware
//!
//! Active-low momentary switch on the BOOT strap pin. GPIO fires on the
//! falling edge; the ISR records the raw timestamp into an atomic, and
//! `tick()` (called from the main loop each iteration) runs the debounce
//! window and confirms the press against the pin level.
//!
//! The debounce window doubles as the re-entry guard: however much the
//! contact bounces, at most one confirmed press emerges per window, and
//! the main loop sees it as a single event.  A confirmed press wipes the
//! pairing state and hard-resets the device, so there is no multi-gesture
//! vocabulary here — one button, one meaning.

use core::sync::atomic::{AtomicU32, Ordering};

/// Raw ISR timestamp (milliseconds since boot, truncated to u32).
/// Written by the ISR, read by the main loop.
static BUTTON_ISR_TIMESTAMP: AtomicU32 = AtomicU32::new(0);

/// Button events emitted after debounce confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    /// The button was held through the full debounce window.
    Pressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebounceState {
    Idle,
    DebounceWait { since_ms: u32 },
}

pub struct ResetButton {
    debounce_ms: u32,
    state: DebounceState,
    last_isr_ms: u32,
}

impl ResetButton {
    pub fn new(debounce_ms: u32) -> Self {
        Self {
            debounce_ms,
            state: DebounceState::Idle,
            last_isr_ms: 0,
        }
    }

    /// Call from the main loop each iteration.
    /// `now_ms` is the current monotonic time in milliseconds.
    pub fn tick(&mut self, now_ms: u32) -> Option<ButtonEvent> {
        let isr_ms = BUTTON_ISR_TIMESTAMP.load(Ordering::Acquire);
        let new_press = isr_ms != self.last_isr_ms && isr_ms != 0;

        match self.state {
            DebounceState::Idle => {
                if new_press {
                    self.last_isr_ms = isr_ms;
                    self.state = DebounceState::DebounceWait { since_ms: now_ms };
                }
                None
            }

            DebounceState::DebounceWait { since_ms } => {
                if now_ms.wrapping_sub(since_ms) < self.debounce_ms {
                    return None;
                }
                self.state = DebounceState::Idle;
                // Contact must still be closed after the window;
                // bounce and electrical noise read as released here.
                if Self::is_pressed_hw() {
                    Some(ButtonEvent::Pressed)
                } else {
                    None
                }
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn is_pressed_hw() -> bool {
        // Active low.
        !crate::drivers::hw_init::gpio_read(crate::pins::BUTTON_GPIO)
    }

    #[cfg(not(target_os = "espidf"))]
    fn is_pressed_hw() -> bool {
        false
    }
}

/// ISR handler — registered on the button GPIO falling edge.
/// Safe to call from interrupt context (lock-free atomic store).
#[allow(unused)]
pub fn button_isr_handler(now_ms: u32) {
    BUTTON_ISR_TIMESTAMP.store(now_ms, Ordering::Release);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reset_isr() {
        BUTTON_ISR_TIMESTAMP.store(0, Ordering::SeqCst);
    }

    #[test]
    fn no_events_without_press() {
        reset_isr();
        let mut btn = ResetButton::new(1000);
        assert_eq!(btn.tick(100), None);
        assert_eq!(btn.tick(2200), None);
    }

    #[test]
    fn bounce_inside_window_is_a_single_candidate() {
        reset_isr();
        let mut btn = ResetButton::new(1000);
        button_isr_handler(100);
        assert_eq!(btn.tick(100), None);
        // Re-triggering ISRs during the window don't restart it.
        button_isr_handler(300);
        button_isr_handler(600);
        assert_eq!(btn.tick(700), None);
    }

    #[test]
    fn released_before_window_elapses_is_discarded() {
        reset_isr();
        let mut btn = ResetButton::new(1000);
        button_isr_handler(100);
        btn.tick(100);
        // Window elapsed, but the (simulated) pin reads released.
        assert_eq!(btn.tick(1200), None);
        // Back to idle: no spurious late events.
        assert_eq!(btn.tick(1300), None);
    }
}
