//! Device reset and blocking delays.
//!
//! The reset policy lives in `main` (one exhaustive match over the error
//! taxonomy); this module is only the mechanism.  On the host, a reset
//! terminates the process instead — integration tests never reach it
//! because the service reports reboots through `Disposition`.

use log::error;

/// Unconditional hardware reset.  Does not return on the device.
pub fn device_reset() -> ! {
    error!("### device reset ###");

    #[cfg(target_os = "espidf")]
    unsafe {
        esp_idf_svc::sys::esp_restart();
    }

    #[cfg(not(target_os = "espidf"))]
    std::process::exit(1);

    #[cfg(target_os = "espidf")]
    unreachable!("esp_restart does not return");
}

/// Blocking sleep.  FreeRTOS-aware through the ESP-IDF std layer, plain
/// thread sleep on the host.
pub fn sleep_ms(ms: u32) {
    std::thread::sleep(core::time::Duration::from_millis(u64::from(ms)));
}

pub fn sleep_secs(secs: u32) {
    sleep_ms(secs.saturating_mul(1_000));
}

/// Milliseconds since boot, truncated to u32 (wraps after ~49 days).
/// Consumers compare timestamps with `wrapping_sub`.
#[cfg(target_os = "espidf")]
pub fn uptime_ms() -> u32 {
    // esp_timer_get_time is monotonic microseconds since boot.
    (unsafe { esp_idf_svc::sys::esp_timer_get_time() } / 1_000) as u32
}

#[cfg(not(target_os = "espidf"))]
pub fn uptime_ms() -> u32 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_millis() as u32
}
