//! Remote command vocabulary.
//!
//! The control server hands the device at most one pending command per
//! poll. The wire shape is a loosely-typed JSON object; it is parsed
//! exactly once at this boundary into [`CommandKind`], so the dispatch
//! site in [`service`](super::service) is an exhaustive match instead of
//! chained string comparisons.
//!
//! Wire shape:
//!
//! ```json
//! { "command": { "key": "coins", "value": "5" }, ... }
//! ```
//!
//! `value` arrives as either a JSON string or an integer depending on the
//! server version; both are accepted. A recognised key whose required
//! payload is missing or unparsable degrades to [`CommandKind::Invalid`],
//! which the dispatcher no-ops but still acknowledges — a malformed
//! command must never wedge the poll loop.

use serde::Deserialize;
use serde_json::Value;

use crate::update::Component;

// ───────────────────────────────────────────────────────────────
// Wire envelope
// ───────────────────────────────────────────────────────────────

/// Top-level poll response. Status fields other than `command` are
/// server-side bookkeeping and ignored by the device.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PollResponse {
    #[serde(default)]
    pub command: Option<CommandEnvelope>,
}

/// Raw command object as sent by the server.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandEnvelope {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub address: Option<i64>,
}

// ───────────────────────────────────────────────────────────────
// Parsed command
// ───────────────────────────────────────────────────────────────

/// One remote instruction, fully typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    /// Download a replacement for `component` and stage it for the next
    /// boot, then reboot.
    Update { component: Component, url: String },
    /// Clear a latched washer error.
    ResetError,
    /// Query the machine state (side effect: refreshes the bus snapshot).
    GetStatus,
    /// Select a wash program by menu index.
    SelectProgram { program: i32 },
    /// Credit coins.
    AddCoins { count: i32 },
    /// Start the selected program.
    Start,
    /// Stop the running program.
    Stop,
    /// Raw register write.
    RawRegister { address: i32, value: i32 },
    /// Restart the controller after a grace delay.
    Reboot,
    /// Key was recognised but its payload was missing/unusable, or the
    /// key is unknown to this firmware. No-op, still acknowledged.
    Invalid,
}

impl CommandKind {
    /// Parse the wire envelope. `None` means the server has no pending
    /// command (absent object or empty key) — nothing to acknowledge.
    pub fn parse(envelope: &CommandEnvelope) -> Option<Self> {
        if envelope.key.is_empty() {
            return None;
        }

        let parsed = match envelope.key.as_str() {
            "update_wash" => url_value(envelope).map(|url| Self::Update {
                component: Component::Wash,
                url,
            }),
            "update_main" => url_value(envelope).map(|url| Self::Update {
                component: Component::Main,
                url,
            }),
            "reset_error" => Some(Self::ResetError),
            "get_status" => Some(Self::GetStatus),
            "menu" => int_value(envelope).map(|program| Self::SelectProgram { program }),
            "coins" => int_value(envelope).map(|count| Self::AddCoins { count }),
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            "command" => match (envelope.address, int_value(envelope)) {
                (Some(address), Some(value)) => Some(Self::RawRegister {
                    address: address as i32,
                    value,
                }),
                _ => None,
            },
            "reboot" => Some(Self::Reboot),
            _ => None,
        };

        Some(parsed.unwrap_or(Self::Invalid))
    }
}

/// `value` as a non-empty URL string.
fn url_value(envelope: &CommandEnvelope) -> Option<String> {
    match &envelope.value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// `value` as an integer; accepts both `5` and `"5"`.
fn int_value(envelope: &CommandEnvelope) -> Option<i32> {
    match &envelope.value {
        Some(Value::Number(n)) => n.as_i64().map(|v| v as i32),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}
