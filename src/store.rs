//! Pairing / credential file store.
//!
//! Two small files in the data directory:
//!
//! - `version.json` — the pairing marker: schema version plus whether the
//!   device has been through WiFi provisioning.  JSON so field tooling
//!   can inspect it over the serial console.
//! - `wifi.dat` — credential lines in `ssid;password` form.  Lines that
//!   don't split cleanly are skipped, not fatal; the last valid line
//!   wins.
//!
//! A connectivity reset rewrites the marker to version 0 / unpaired and
//! deletes the credential file, forcing re-provisioning on next boot.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

const MARKER_FILE: &str = "version.json";
const CRED_FILE: &str = "wifi.dat";

/// Current pairing-marker schema version.
pub const MARKER_VERSION: u32 = 1;

// ───────────────────────────────────────────────────────────────
// Marker
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingMarker {
    pub version: u32,
    #[serde(default)]
    pub paired: bool,
}

impl Default for PairingMarker {
    fn default() -> Self {
        Self {
            version: MARKER_VERSION,
            paired: false,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Credentials
// ───────────────────────────────────────────────────────────────

/// One `ssid;password` pair from the credential file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
}

// ───────────────────────────────────────────────────────────────
// Store
// ───────────────────────────────────────────────────────────────

pub struct PairingStore {
    dir: PathBuf,
}

impl PairingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn marker_path(&self) -> PathBuf {
        self.dir.join(MARKER_FILE)
    }

    fn cred_path(&self) -> PathBuf {
        self.dir.join(CRED_FILE)
    }

    // ── Marker ────────────────────────────────────────────────

    /// Load the pairing marker; a missing file reads as the default
    /// (current version, unpaired).
    pub fn load_marker(&self) -> Result<PairingMarker, StoreError> {
        let bytes = match fs::read(self.marker_path()) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(PairingMarker::default()),
            Err(e) => return Err(StoreError::Io(e.kind())),
        };
        serde_json::from_slice(&bytes).map_err(|_| StoreError::Malformed)
    }

    pub fn save_marker(&self, marker: &PairingMarker) -> Result<(), StoreError> {
        let body = serde_json::to_vec(marker).map_err(|_| StoreError::Malformed)?;
        fs::write(self.marker_path(), body).map_err(|e| StoreError::Io(e.kind()))
    }

    // ── Credentials ───────────────────────────────────────────

    /// Whether a credential file exists at all.  The connect wait loop
    /// resets the device when this goes false mid-wait.
    pub fn credentials_present(&self) -> bool {
        self.cred_path().exists()
    }

    /// Read stored WiFi credentials.  Unparsable or over-length lines
    /// are skipped with a warning; the last valid line wins.  `None`
    /// when the file is absent or holds no valid line.
    pub fn read_credentials(&self) -> Option<WifiCredentials> {
        let text = match fs::read_to_string(self.cred_path()) {
            Ok(t) => t,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    warn!("store: credential read failed: {e}");
                }
                return None;
            }
        };

        let mut creds = None;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((ssid, password)) = line.split_once(';') else {
                warn!("store: skipping malformed credential line");
                continue;
            };
            let (Ok(ssid), Ok(password)) = (
                heapless::String::try_from(ssid),
                heapless::String::try_from(password),
            ) else {
                warn!("store: skipping over-length credential line");
                continue;
            };
            creds = Some(WifiCredentials { ssid, password });
        }
        creds
    }

    // ── Connectivity reset ────────────────────────────────────

    /// Clear pairing state: marker back to version 0 / unpaired, and the
    /// credential file removed.  Forces re-provisioning on next boot.
    pub fn reset_pairing(&self) -> Result<(), StoreError> {
        self.save_marker(&PairingMarker {
            version: 0,
            paired: false,
        })?;

        match fs::remove_file(self.cred_path()) {
            Ok(()) => info!("store: pairing reset, credentials removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("store: pairing reset, no credentials were stored");
            }
            Err(e) => return Err(StoreError::Io(e.kind())),
        }
        Ok(())
    }
}
