//! Unified error types for the WashLink firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the
//! top-level reset policy in `main` is one exhaustive match instead of a
//! catch-all.  All variants are `Copy` (filesystem errors carry
//! `io::ErrorKind`, not the boxed `io::Error`) so they can be passed
//! around without allocation.

use core::fmt;
use std::io;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// HTTP transport failed (connect, timeout, read).
    Http(HttpError),
    /// The control server returned a body that is not valid JSON.
    Parse(ParseError),
    /// Staging a firmware download to disk failed.
    Stage(StageError),
    /// Boot-time promotion of a staged file failed.
    Promote(PromoteError),
    /// Pairing-marker / credential file access failed.
    Store(StoreError),
    /// The appliance bus rejected or failed a command.
    Washer(WasherError),
    /// WiFi association gave up or produced an unusable address.
    Connectivity(ConnectivityFault),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "http: {e}"),
            Self::Parse(e) => write!(f, "parse: {e}"),
            Self::Stage(e) => write!(f, "stage: {e}"),
            Self::Promote(e) => write!(f, "promote: {e}"),
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Washer(e) => write!(f, "washer: {e}"),
            Self::Connectivity(e) => write!(f, "connectivity: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// HTTP transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    /// TCP connect failed or the host is unreachable.
    ConnectFailed,
    /// The transfer stalled past the client timeout.
    Timeout,
    /// Read or write on an established connection failed.
    Io,
    /// Response body exceeded the receive buffer budget.
    BodyTooLarge,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::Timeout => write!(f, "transfer timed out"),
            Self::Io => write!(f, "transport I/O failed"),
            Self::BodyTooLarge => write!(f, "response body too large"),
        }
    }
}

impl From<HttpError> for Error {
    fn from(e: HttpError) -> Self {
        Self::Http(e)
    }
}

// ---------------------------------------------------------------------------
// Wire parse errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Poll response body was not valid JSON.
    InvalidJson,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson => write!(f, "poll body is not valid JSON"),
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

// ---------------------------------------------------------------------------
// Poll-cycle errors (non-fatal by policy: the loop continues)
// ---------------------------------------------------------------------------

/// Failure modes of a single poll cycle.  Both variants are recovered at
/// the call site: the device still pushes a best-effort status payload
/// and re-polls on the next iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollError {
    Network(HttpError),
    Parse(ParseError),
}

impl fmt::Display for PollError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(e) => write!(f, "network: {e}"),
            Self::Parse(e) => write!(f, "parse: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Staging / promotion errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageError {
    /// Download transport failed before any file was touched.
    Download(HttpError),
    /// Writing the temporary `.part` file failed.
    Write(io::ErrorKind),
    /// The final atomic rename `.part` → `.staged` failed.
    Commit(io::ErrorKind),
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Download(e) => write!(f, "download failed: {e}"),
            Self::Write(kind) => write!(f, "part write failed: {kind:?}"),
            Self::Commit(kind) => write!(f, "staged rename failed: {kind:?}"),
        }
    }
}

impl From<StageError> for Error {
    fn from(e: StageError) -> Self {
        Self::Stage(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromoteError {
    /// Renaming `.staged` over the active file failed for at least one
    /// component.  Promotion is best-effort per component; this carries
    /// the first failure observed.
    Rename(io::ErrorKind),
}

impl fmt::Display for PromoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rename(kind) => write!(f, "promotion rename failed: {kind:?}"),
        }
    }
}

impl From<PromoteError> for Error {
    fn from(e: PromoteError) -> Self {
        Self::Promote(e)
    }
}

// ---------------------------------------------------------------------------
// Pairing store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    Io(io::ErrorKind),
    /// Marker file exists but is not valid JSON.
    Malformed,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(kind) => write!(f, "I/O failed: {kind:?}"),
            Self::Malformed => write!(f, "marker file malformed"),
        }
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Appliance bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WasherError {
    /// UART write to the washer control board failed.
    BusWrite,
    /// The washer did not answer within the frame timeout.
    NoResponse,
    /// Response frame failed the checksum.
    BadFrame,
    /// The washer refused the command (busy, door open, fault latched).
    Rejected,
}

impl fmt::Display for WasherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusWrite => write!(f, "bus write failed"),
            Self::NoResponse => write!(f, "no response from washer"),
            Self::BadFrame => write!(f, "bad response frame"),
            Self::Rejected => write!(f, "command rejected"),
        }
    }
}

impl From<WasherError> for Error {
    fn from(e: WasherError) -> Self {
        Self::Washer(e)
    }
}

// ---------------------------------------------------------------------------
// Connectivity faults (terminal: every one maps to a device reset)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityFault {
    /// Association failed `MAX_CONNECT_ATTEMPTS` times in a row.  The
    /// pairing marker is cleared before the reset so the next boot
    /// re-provisions.
    RetriesExhausted { attempts: u32 },
    /// DHCP handed out the null address `0.0.0.0`.
    NullAddress,
    /// No credential file present while waiting for association.
    CredentialsMissing,
}

impl fmt::Display for ConnectivityFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetriesExhausted { attempts } => {
                write!(f, "association failed after {attempts} attempts")
            }
            Self::NullAddress => write!(f, "acquired null address 0.0.0.0"),
            Self::CredentialsMissing => write!(f, "credential file missing"),
        }
    }
}

impl From<ConnectivityFault> for Error {
    fn from(e: ConnectivityFault) -> Self {
        Self::Connectivity(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
