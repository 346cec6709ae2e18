//! System configuration parameters
//!
//! All tunable parameters for the WashLink controller.  Compiled-in
//! defaults match the deployed fleet; a data-directory override file can
//! replace them at boot.

use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Override file name, relative to the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// Blocking HTTP exchanges one loop iteration can legitimately perform in
/// sequence: poll GET, update-download GET, ack PUT.
const MAX_HTTP_OPS_PER_ITERATION: u32 = 3;

/// Watchdog headroom over the HTTP worst case, covering the appliance-bus
/// exchange, settle delay, and idle sleep.
const WATCHDOG_SLACK_SECS: u32 = 30;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Control endpoint ---
    /// Base URL of the command-and-control API, no trailing slash.
    /// Per-device URLs are `{endpoint}/{serial}`.
    pub endpoint: String,

    // --- Timing ---
    /// Idle sleep between poll cycles (milliseconds).
    pub poll_interval_ms: u32,
    /// Settle delay after appliance-bus commands (milliseconds).
    pub settle_delay_ms: u32,
    /// Delay before honouring an explicit `reboot` command (seconds).
    pub reboot_delay_secs: u32,
    /// Wait between WiFi association checks (seconds).
    pub connect_retry_secs: u32,
    /// HTTP client timeout (seconds).
    pub http_timeout_secs: u32,

    // --- Self-update ---
    /// Directory holding the active and staged component files.
    pub data_dir: String,
    /// Largest accepted update download (bytes).
    pub max_update_bytes: usize,

    // --- Button ---
    /// Reset-button debounce window (milliseconds).
    pub button_debounce_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://34.124.162.209/api-wash".into(),

            poll_interval_ms: 1_000,
            settle_delay_ms: 1_000,
            reboot_delay_secs: 5,
            connect_retry_secs: 10,
            http_timeout_secs: 30,

            data_dir: "/spiffs".into(),
            max_update_bytes: 256 * 1024,

            button_debounce_ms: 1_000,
        }
    }
}

impl SystemConfig {
    /// Load the override file from `dir`, falling back to compiled-in
    /// defaults when it is absent or unreadable.  A malformed file is
    /// logged and ignored rather than wedging boot.
    pub fn load_or_default(dir: &str) -> Self {
        let path = Path::new(dir).join(CONFIG_FILE);
        match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<SystemConfig>(&bytes) {
                Ok(cfg) => {
                    info!("config: loaded override from {}", path.display());
                    cfg
                }
                Err(e) => {
                    warn!("config: malformed override ({e}), using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Task-watchdog budget for one control-loop iteration.
    ///
    /// An update cycle blocks for up to three sequential HTTP exchanges
    /// (poll, download, ack), each bounded only by the client timeout, so
    /// the budget must cover all of them plus slack — a slow-but-honest
    /// update or a dead server must re-poll, never panic the watchdog.
    pub fn watchdog_budget_secs(&self) -> u32 {
        MAX_HTTP_OPS_PER_ITERATION * self.http_timeout_secs + WATCHDOG_SLACK_SECS
    }

    /// Reject configurations that would wedge the control loop.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_empty() || !self.endpoint.starts_with("http") {
            return Err(Error::Init("endpoint must be an http(s) URL"));
        }
        if self.endpoint.ends_with('/') {
            return Err(Error::Init("endpoint must not end with '/'"));
        }
        if !(100..=60_000).contains(&self.poll_interval_ms) {
            return Err(Error::Init("poll_interval_ms must be 100–60000"));
        }
        if self.http_timeout_secs == 0 || self.http_timeout_secs > 300 {
            return Err(Error::Init("http_timeout_secs must be 1–300"));
        }
        if self.max_update_bytes == 0 {
            return Err(Error::Init("max_update_bytes must be non-zero"));
        }
        Ok(())
    }
}
