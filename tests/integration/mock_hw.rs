//! Mock adapters for integration tests.
//!
//! Records every appliance-bus and HTTP call so tests can assert on the
//! full exchange history without a UART or a network.

use std::collections::VecDeque;

use serde_json::{json, Value};
use washlink::app::ports::{HttpPort, HttpResponse, WasherPort};
use washlink::error::{HttpError, WasherError};

// ── Washer call record ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WasherCall {
    GetStatus,
    SelectProgram(i32),
    AddCoins(i32),
    Start,
    Stop,
    SendCommand { address: i32, value: i32 },
    ResetError,
}

// ── MockWasher ────────────────────────────────────────────────

pub struct MockWasher {
    pub calls: Vec<WasherCall>,
    /// When set, every bus operation fails with this error.
    pub fail_with: Option<WasherError>,
    pub status: Value,
}

#[allow(dead_code)]
impl MockWasher {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            fail_with: None,
            status: json!({ "state": "idle", "credit": 0 }),
        }
    }

    pub fn dead_bus() -> Self {
        Self {
            fail_with: Some(WasherError::NoResponse),
            ..Self::new()
        }
    }

    pub fn last_call(&self) -> Option<&WasherCall> {
        self.calls.last()
    }

    fn record(&mut self, call: WasherCall) -> Result<(), WasherError> {
        self.calls.push(call);
        match self.fail_with {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for MockWasher {
    fn default() -> Self {
        Self::new()
    }
}

impl WasherPort for MockWasher {
    fn get_machine_status(&mut self) -> Result<Value, WasherError> {
        self.record(WasherCall::GetStatus)?;
        Ok(self.status.clone())
    }

    fn select_program(&mut self, program: i32) -> Result<(), WasherError> {
        self.record(WasherCall::SelectProgram(program))
    }

    fn add_coins(&mut self, count: i32) -> Result<(), WasherError> {
        self.record(WasherCall::AddCoins(count))
    }

    fn start_operation(&mut self) -> Result<(), WasherError> {
        self.record(WasherCall::Start)
    }

    fn stop_operation(&mut self) -> Result<(), WasherError> {
        self.record(WasherCall::Stop)
    }

    fn send_command(&mut self, address: i32, value: i32) -> Result<(), WasherError> {
        self.record(WasherCall::SendCommand { address, value })
    }

    fn reset_error(&mut self) -> Result<(), WasherError> {
        self.record(WasherCall::ResetError)
    }
}

// ── MockHttp ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum HttpCall {
    Get(String),
    PutJson { url: String, body: Value },
}

/// Scripted HTTP transport: GETs pop pre-loaded responses in order, PUTs
/// succeed (or fail wholesale) and are recorded.
pub struct MockHttp {
    script: VecDeque<Result<HttpResponse, HttpError>>,
    pub put_result: Result<u16, HttpError>,
    pub calls: Vec<HttpCall>,
}

#[allow(dead_code)]
impl MockHttp {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            put_result: Ok(200),
            calls: Vec::new(),
        }
    }

    pub fn push_response(&mut self, status: u16, body: &[u8]) {
        self.script.push_back(Ok(HttpResponse {
            status,
            body: body.to_vec(),
        }));
    }

    pub fn push_error(&mut self, error: HttpError) {
        self.script.push_back(Err(error));
    }

    /// URLs of every PUT, in order.
    pub fn put_urls(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HttpCall::PutJson { url, .. } => Some(url.as_str()),
                HttpCall::Get(_) => None,
            })
            .collect()
    }

    /// URLs of every GET, in order.
    pub fn get_urls(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HttpCall::Get(url) => Some(url.as_str()),
                HttpCall::PutJson { .. } => None,
            })
            .collect()
    }
}

impl Default for MockHttp {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpPort for MockHttp {
    fn get(&mut self, url: &str) -> Result<HttpResponse, HttpError> {
        self.calls.push(HttpCall::Get(url.to_string()));
        self.script
            .pop_front()
            .unwrap_or(Err(HttpError::ConnectFailed))
    }

    fn put_json(&mut self, url: &str, body: &Value) -> Result<u16, HttpError> {
        self.calls.push(HttpCall::PutJson {
            url: url.to_string(),
            body: body.clone(),
        });
        self.put_result
    }
}
