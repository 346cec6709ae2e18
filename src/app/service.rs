//! Control service — the hexagonal core.
//!
//! [`ControlService`] owns one poll cycle: fetch the pending command,
//! dispatch it to the appliance or the updater, acknowledge it, and push
//! the status payload.  All I/O flows through port traits injected at
//! call sites, so the whole protocol runs against mocks on the host.
//!
//! ```text
//!  HttpPort ──▶ ┌──────────────────────────┐ ──▶ HttpPort (ack/status)
//!               │      ControlService       │
//! WasherPort ◀──│  parse · dispatch · stage │
//!               └──────────────────────────┘
//! ```
//!
//! Reset and delay policy deliberately lives in `main`: the service
//! reports what should happen next via [`Disposition`] instead of
//! sleeping or rebooting itself, which keeps every branch testable.

use log::{info, warn};
use serde::Serialize;
use serde_json::{Value, json};

use crate::config::SystemConfig;
use crate::error::{ParseError, PollError};
use crate::update::{StageOutcome, Updater};

use super::command::{CommandKind, PollResponse};
use super::ports::{HttpPort, WasherPort};

// ───────────────────────────────────────────────────────────────
// Loop directives
// ───────────────────────────────────────────────────────────────

/// What the main loop must do after a poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Nothing pending or a reboot-free command; poll again after the
    /// normal idle interval.
    Continue,
    /// An appliance-bus command executed; give the bus its settle delay
    /// before the next poll.
    Settle,
    /// Restart the device after `delay_secs` (staged update or explicit
    /// reboot command).
    Reboot { delay_secs: u32 },
}

// ───────────────────────────────────────────────────────────────
// Status payload
// ───────────────────────────────────────────────────────────────

/// Per-iteration status snapshot pushed to the control server.
/// Transient — rebuilt every loop, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct StatusPayload {
    pub ip: String,
    pub client_id: String,
    pub status: Value,
}

// ───────────────────────────────────────────────────────────────
// ControlService
// ───────────────────────────────────────────────────────────────

pub struct ControlService {
    poll_url: String,
    ack_url: String,
    reboot_delay_secs: u32,
    updater: Updater,
}

impl ControlService {
    /// `serial` is the device identity; per-device URLs hang off it.
    pub fn new(config: &SystemConfig, serial: &str) -> Self {
        let poll_url = format!("{}/{}", config.endpoint, serial);
        let ack_url = format!("{}/command", poll_url);
        Self {
            poll_url,
            ack_url,
            reboot_delay_secs: config.reboot_delay_secs,
            updater: Updater::new(config.data_dir.as_str(), config.max_update_bytes),
        }
    }

    // ── One poll cycle ────────────────────────────────────────

    /// Fetch the pending command and execute it.
    ///
    /// Transport and parse failures are non-fatal by design: a degraded
    /// status push is still attempted and the error is returned only so
    /// the caller can log it before the next iteration.  When no command
    /// is pending, the regular status report is sent instead.
    pub fn poll_and_dispatch(
        &mut self,
        payload: &StatusPayload,
        http: &mut impl HttpPort,
        washer: &mut impl WasherPort,
    ) -> Result<Disposition, PollError> {
        let response = match self.fetch(http) {
            Ok(r) => r,
            Err(e) => {
                // Degraded fallback: the server still learns we're alive.
                if self.report(payload, http).is_err() {
                    warn!("status: degraded report also failed");
                }
                return Err(e);
            }
        };

        match response.command.as_ref().and_then(CommandKind::parse) {
            Some(kind) => Ok(self.dispatch(kind, http, washer)),
            None => {
                if let Err(e) = self.report(payload, http) {
                    warn!("status: report failed: {e}");
                }
                Ok(Disposition::Continue)
            }
        }
    }

    fn fetch(&self, http: &mut impl HttpPort) -> Result<PollResponse, PollError> {
        let response = http.get(&self.poll_url).map_err(PollError::Network)?;
        serde_json::from_slice(&response.body)
            .map_err(|_| PollError::Parse(ParseError::InvalidJson))
    }

    // ── Dispatch ──────────────────────────────────────────────

    /// Execute exactly one command.  Every branch acknowledges, whether
    /// or not the handler succeeded — the server must not re-deliver a
    /// command forever because its side effect failed locally.
    fn dispatch(
        &mut self,
        kind: CommandKind,
        http: &mut impl HttpPort,
        washer: &mut impl WasherPort,
    ) -> Disposition {
        info!("command: {kind:?}");

        match kind {
            CommandKind::Update { component, url } => {
                let staged = match self.updater.stage(component, &url, http) {
                    Ok(StageOutcome::Staged) => true,
                    Ok(StageOutcome::Skipped) => false,
                    Err(e) => {
                        warn!("update[{component}]: {e}");
                        false
                    }
                };
                self.ack(http);
                if staged {
                    // New code only becomes active after promotion, so
                    // command execution and reboot are merged.
                    Disposition::Reboot { delay_secs: 0 }
                } else {
                    // Failed download drops the update until re-issued.
                    Disposition::Continue
                }
            }

            CommandKind::ResetError => {
                if let Err(e) = washer.reset_error() {
                    warn!("washer: reset_error failed: {e}");
                }
                self.ack(http);
                Disposition::Continue
            }

            CommandKind::GetStatus => {
                match washer.get_machine_status() {
                    Ok(status) => info!("washer: status {status}"),
                    Err(e) => warn!("washer: get_status failed: {e}"),
                }
                self.ack(http);
                Disposition::Continue
            }

            CommandKind::SelectProgram { program } => {
                if let Err(e) = washer.select_program(program) {
                    warn!("washer: select_program({program}) failed: {e}");
                }
                self.ack(http);
                Disposition::Continue
            }

            CommandKind::AddCoins { count } => {
                if let Err(e) = washer.add_coins(count) {
                    warn!("washer: add_coins({count}) failed: {e}");
                }
                self.ack(http);
                Disposition::Settle
            }

            CommandKind::Start => {
                if let Err(e) = washer.start_operation() {
                    warn!("washer: start failed: {e}");
                }
                self.ack(http);
                Disposition::Settle
            }

            CommandKind::Stop => {
                if let Err(e) = washer.stop_operation() {
                    warn!("washer: stop failed: {e}");
                }
                self.ack(http);
                Disposition::Settle
            }

            CommandKind::RawRegister { address, value } => {
                if let Err(e) = washer.send_command(address, value) {
                    warn!("washer: send_command({address}, {value}) failed: {e}");
                }
                self.ack(http);
                Disposition::Settle
            }

            CommandKind::Reboot => {
                self.ack(http);
                Disposition::Reboot {
                    delay_secs: self.reboot_delay_secs,
                }
            }

            CommandKind::Invalid => {
                warn!("command: unusable envelope, acknowledging as no-op");
                self.ack(http);
                Disposition::Continue
            }
        }
    }

    // ── Server exchanges ──────────────────────────────────────

    /// Clear the pending command server-side.  Failure is logged, never
    /// retried: the next poll re-fetches and handlers tolerate
    /// re-delivery.
    fn ack(&self, http: &mut impl HttpPort) {
        match http.put_json(&self.ack_url, &json!({})) {
            Ok(status) if status == 200 => {}
            Ok(status) => warn!("ack: server answered {status}, command may re-deliver"),
            Err(e) => warn!("ack: {e}, command may re-deliver"),
        }
    }

    /// Push the status payload.  No retry — the next loop iteration is
    /// the retry.
    pub fn report(
        &self,
        payload: &StatusPayload,
        http: &mut impl HttpPort,
    ) -> Result<(), crate::error::HttpError> {
        let body = serde_json::to_value(payload).unwrap_or_else(|_| json!({}));
        http.put_json(&self.poll_url, &body).map(|_| ())
    }

    /// Poll URL (`{endpoint}/{serial}`), for logging.
    pub fn poll_url(&self) -> &str {
        &self.poll_url
    }
}
