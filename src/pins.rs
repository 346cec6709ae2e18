//! GPIO / peripheral pin assignments for the WashLink controller board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Status LED
// ---------------------------------------------------------------------------

/// Activity LED (active HIGH). On while a poll cycle runs, blink patterns
/// signal WiFi reset.
pub const LED_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// WiFi reset button (active-low, BOOT strap pin with internal pull-up)
// ---------------------------------------------------------------------------

/// Momentary push-button; a confirmed press clears the pairing marker
/// and hard-resets the device.
pub const BUTTON_GPIO: i32 = 0;

// ---------------------------------------------------------------------------
// Appliance UART (RS-232 level shifter to the washer control board)
// ---------------------------------------------------------------------------

pub const WASHER_UART_PORT: i32 = 1;
pub const WASHER_UART_TX_GPIO: i32 = 17;
pub const WASHER_UART_RX_GPIO: i32 = 18;
pub const WASHER_UART_BAUD: u32 = 9_600;
