//! Task Watchdog Timer (TWDT) driver.
//!
//! Subscribes the main task to the ESP-IDF task watchdog so a wedged
//! control loop panics (and resets) instead of hanging silently.
//!
//! The timeout must cover the longest legitimate blocking stretch in one
//! loop iteration.  An update cycle can hold the task for several
//! back-to-back HTTP transfers, each bounded only by the client timeout,
//! so callers size the watchdog from
//! [`SystemConfig::watchdog_budget_secs`](crate::config::SystemConfig::watchdog_budget_secs)
//! rather than hardcoding a tick budget.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl Watchdog {
    /// Initialise and subscribe the current task to the TWDT.
    pub fn new(timeout_secs: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms: timeout_secs * 1000,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    log::warn!(
                        "TWDT reconfigure returned {} (may already be configured)",
                        ret
                    );
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK;
                if subscribed {
                    info!("watchdog: subscribed ({timeout_secs}s timeout, panic on trigger)");
                } else {
                    log::warn!("watchdog: failed to subscribe ({ret})");
                }

                Self { subscribed }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("watchdog(sim): no-op ({timeout_secs}s timeout)");
            Self {}
        }
    }

    /// Feed the watchdog. Must be called once per loop iteration.
    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }
    }
}
