//! Reboot/recovery controller.
//!
//! Tracks WiFi association attempts and decides when "reset and retry
//! from a clean state" is the correct recovery action.  There is no
//! in-process recovery from [`RecoveryState::Faulted`]: every fault
//! branch ends in an unconditional hardware reset, and recovery is
//! delegated to the next boot cycle.
//!
//! ```text
//! Connecting(n) ──success──▶ Connected ──null IP / loop error──▶ reset
//!      │
//!      └─ n ≥ MAX_CONNECT_ATTEMPTS ──▶ Faulted: clear pairing, reset
//! ```

use crate::error::ConnectivityFault;

/// Consecutive association failures tolerated before the pairing state
/// is cleared and the device hard-resets.
pub const MAX_CONNECT_ATTEMPTS: u32 = 10;

/// Null address handed out by DHCP when the lease never completed.
pub const NULL_ADDRESS: &str = "0.0.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryState {
    /// Waiting for association; `attempts` failures so far.
    Connecting { attempts: u32 },
    /// Associated with a usable address.
    Connected,
    /// Terminal. The caller must reset the device.
    Faulted(ConnectivityFault),
}

/// Process-wide connectivity state. Reset to zero attempts on every
/// successful association; destroyed implicitly by the device reset.
pub struct RecoveryController {
    state: RecoveryState,
}

impl RecoveryController {
    pub fn new() -> Self {
        Self {
            state: RecoveryState::Connecting { attempts: 0 },
        }
    }

    pub fn state(&self) -> RecoveryState {
        self.state
    }

    /// Failures recorded so far while connecting.
    pub fn attempts(&self) -> u32 {
        match self.state {
            RecoveryState::Connecting { attempts } => attempts,
            _ => 0,
        }
    }

    /// Record one failed association check.  Returns the fault once the
    /// threshold is reached — the caller clears pairing and resets.
    pub fn on_attempt_failed(&mut self) -> Option<ConnectivityFault> {
        let RecoveryState::Connecting { attempts } = self.state else {
            return None;
        };
        let attempts = attempts + 1;
        if attempts >= MAX_CONNECT_ATTEMPTS {
            let fault = ConnectivityFault::RetriesExhausted { attempts };
            self.state = RecoveryState::Faulted(fault);
            return Some(fault);
        }
        self.state = RecoveryState::Connecting { attempts };
        None
    }

    /// The credential file vanished mid-wait; nothing to retry against.
    pub fn on_credentials_missing(&mut self) -> ConnectivityFault {
        let fault = ConnectivityFault::CredentialsMissing;
        self.state = RecoveryState::Faulted(fault);
        fault
    }

    /// Successful association. Attempt counter resets with the state.
    pub fn on_connected(&mut self) {
        self.state = RecoveryState::Connected;
    }

    /// Validate the acquired address.  `0.0.0.0` means DHCP never
    /// completed; the device must reset before entering the main loop.
    pub fn check_address(&mut self, ip: &str) -> Option<ConnectivityFault> {
        if ip != NULL_ADDRESS {
            return None;
        }
        let fault = ConnectivityFault::NullAddress;
        self.state = RecoveryState::Faulted(fault);
        Some(fault)
    }
}

impl Default for RecoveryController {
    fn default() -> Self {
        Self::new()
    }
}
