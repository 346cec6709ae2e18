//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlService (domain)
//! ```
//!
//! Driven adapters (appliance bus, HTTP transport, WiFi) implement these
//! traits.  The [`ControlService`](super::service::ControlService) consumes
//! them via generics, so the domain core never touches hardware or sockets
//! directly and every poll/dispatch path runs unmodified on the host.

use serde_json::Value;

use crate::error::{HttpError, WasherError};

// ───────────────────────────────────────────────────────────────
// Appliance port (driven adapter: domain → washer control board)
// ───────────────────────────────────────────────────────────────

/// The washer control board behind its serial bus.  All operations are
/// single-frame request/response exchanges; the wire protocol itself is
/// the adapter's concern.
///
/// Command acknowledgment on the server does not depend on these calls
/// succeeding, so every operation must be idempotent or tolerate
/// re-delivery after a failed ack.
pub trait WasherPort {
    /// Snapshot of the machine state as an opaque JSON document
    /// (program, credit, cycle phase, error flags).
    fn get_machine_status(&mut self) -> Result<Value, WasherError>;

    /// Select a wash program by menu index.
    fn select_program(&mut self, program: i32) -> Result<(), WasherError>;

    /// Credit the machine as if coins had been inserted.
    fn add_coins(&mut self, count: i32) -> Result<(), WasherError>;

    /// Start the selected program.
    fn start_operation(&mut self) -> Result<(), WasherError>;

    /// Stop the running program.
    fn stop_operation(&mut self) -> Result<(), WasherError>;

    /// Raw register write — maintenance escape hatch.
    fn send_command(&mut self, address: i32, value: i32) -> Result<(), WasherError>;

    /// Clear a latched error condition on the control board.
    fn reset_error(&mut self) -> Result<(), WasherError>;
}

// ───────────────────────────────────────────────────────────────
// HTTP port (driven adapter: domain → control server / update host)
// ───────────────────────────────────────────────────────────────

/// A completed HTTP exchange.  Non-2xx statuses are data, not errors —
/// the update path treats a 404 as "nothing staged", not a fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Blocking HTTP transport.  One request at a time; the whole device is
/// deliberately unresponsive for the duration of a transfer.
pub trait HttpPort {
    /// GET `url`. Errors only on transport failure.
    fn get(&mut self, url: &str) -> Result<HttpResponse, HttpError>;

    /// PUT a JSON document to `url` with `Content-Type: application/json`.
    /// Returns the response status.
    fn put_json(&mut self, url: &str, body: &Value) -> Result<u16, HttpError>;
}

// ───────────────────────────────────────────────────────────────
// Connectivity port (driven adapter: domain → WiFi station)
// ───────────────────────────────────────────────────────────────

/// WiFi station association, narrow by design: the retry and reset
/// policy lives in [`RecoveryController`](crate::recovery::RecoveryController),
/// not here.
pub trait ConnectivityPort {
    /// Kick off (or re-kick) association with the stored credentials.
    fn connect(&mut self) -> Result<(), crate::error::ConnectivityFault>;

    /// Whether the station is currently associated.
    fn is_connected(&self) -> bool;

    /// Dotted-quad IPv4 address, if one has been acquired.  `0.0.0.0`
    /// is returned as-is; the recovery controller decides what to do
    /// with it.
    fn ip_address(&self) -> Option<heapless::String<16>>;
}
