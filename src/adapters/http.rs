//! Blocking HTTP adapter.
//!
//! Implements [`HttpPort`] — the transport behind command polling,
//! acknowledgments, status pushes, and update downloads.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::http::client::EspHttpConnection`
//!   wrapped in the `embedded_svc` blocking [`Client`].  One connection per
//!   request; the poll loop is slow enough that keep-alive buys nothing.
//! - **all other targets**: a scripted simulation backend for host tests —
//!   queued responses out, recorded requests in.
//!
//! There is no cancellation: a stalled transfer blocks the control loop
//! until the client timeout (or the task watchdog) fires.

use serde_json::Value;

use crate::app::ports::{HttpPort, HttpResponse};
use crate::error::HttpError;

#[cfg(not(target_os = "espidf"))]
use std::collections::VecDeque;

/// Receive-buffer chunk size for body reads.
#[cfg(target_os = "espidf")]
const READ_CHUNK: usize = 1024;

pub struct HttpClientAdapter {
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    timeout_secs: u32,
    max_body: usize,
    #[cfg(not(target_os = "espidf"))]
    script: VecDeque<Result<HttpResponse, HttpError>>,
    #[cfg(not(target_os = "espidf"))]
    requests: Vec<(&'static str, String)>,
}

impl HttpClientAdapter {
    pub fn new(timeout_secs: u32, max_body: usize) -> Self {
        Self {
            timeout_secs,
            max_body,
            #[cfg(not(target_os = "espidf"))]
            script: VecDeque::new(),
            #[cfg(not(target_os = "espidf"))]
            requests: Vec::new(),
        }
    }

    // ── Platform: ESP-IDF ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_get(&mut self, url: &str) -> Result<HttpResponse, HttpError> {
        use embedded_svc::http::Method;
        use embedded_svc::http::client::Client;
        use embedded_svc::io::Read;
        use esp_idf_svc::http::client::{Configuration as HttpConfig, EspHttpConnection};

        let config = HttpConfig {
            buffer_size: Some(4096),
            timeout: Some(core::time::Duration::from_secs(self.timeout_secs as u64)),
            ..Default::default()
        };
        let connection =
            EspHttpConnection::new(&config).map_err(|_| HttpError::ConnectFailed)?;
        let mut client = Client::wrap(connection);

        let request = client
            .request(Method::Get, url, &[("Content-Type", "application/json")])
            .map_err(|_| HttpError::ConnectFailed)?;
        let mut response = request.submit().map_err(|_| HttpError::Io)?;
        let status = response.status();

        let mut body = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let n = response.read(&mut chunk).map_err(|_| HttpError::Io)?;
            if n == 0 {
                break;
            }
            if body.len() + n > self.max_body {
                return Err(HttpError::BodyTooLarge);
            }
            body.extend_from_slice(&chunk[..n]);
        }

        Ok(HttpResponse { status, body })
    }

    #[cfg(target_os = "espidf")]
    fn platform_put(&mut self, url: &str, body: &[u8]) -> Result<u16, HttpError> {
        use embedded_svc::http::Method;
        use embedded_svc::http::client::Client;
        use embedded_svc::io::Write;
        use esp_idf_svc::http::client::{Configuration as HttpConfig, EspHttpConnection};

        let length = body.len().to_string();
        let config = HttpConfig {
            buffer_size: Some(1024),
            timeout: Some(core::time::Duration::from_secs(self.timeout_secs as u64)),
            ..Default::default()
        };
        let connection =
            EspHttpConnection::new(&config).map_err(|_| HttpError::ConnectFailed)?;
        let mut client = Client::wrap(connection);

        let mut request = client
            .request(
                Method::Put,
                url,
                &[
                    ("Content-Type", "application/json"),
                    ("Content-Length", &length),
                ],
            )
            .map_err(|_| HttpError::ConnectFailed)?;
        request.write_all(body).map_err(|_| HttpError::Io)?;
        request.flush().map_err(|_| HttpError::Io)?;

        let response = request.submit().map_err(|_| HttpError::Io)?;
        Ok(response.status())
    }

    // ── Platform: host simulation ─────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    fn platform_get(&mut self, url: &str) -> Result<HttpResponse, HttpError> {
        self.requests.push(("GET", url.to_string()));
        match self.script.pop_front() {
            Some(Ok(r)) if r.body.len() > self.max_body => Err(HttpError::BodyTooLarge),
            Some(other) => other,
            None => Err(HttpError::ConnectFailed),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_put(&mut self, url: &str, _body: &[u8]) -> Result<u16, HttpError> {
        self.requests.push(("PUT", url.to_string()));
        match self.script.pop_front() {
            Some(Ok(r)) => Ok(r.status),
            Some(Err(e)) => Err(e),
            None => Ok(200),
        }
    }

    // ── Simulation controls (host tests) ──────────────────────

    /// Queue the next scripted exchange.
    #[cfg(not(target_os = "espidf"))]
    pub fn push_response(&mut self, response: Result<HttpResponse, HttpError>) {
        self.script.push_back(response);
    }

    /// Every request made so far, as `(method, url)`.
    #[cfg(not(target_os = "espidf"))]
    pub fn requests(&self) -> &[(&'static str, String)] {
        &self.requests
    }
}

impl HttpPort for HttpClientAdapter {
    fn get(&mut self, url: &str) -> Result<HttpResponse, HttpError> {
        self.platform_get(url)
    }

    fn put_json(&mut self, url: &str, body: &Value) -> Result<u16, HttpError> {
        let bytes = serde_json::to_vec(body).map_err(|_| HttpError::Io)?;
        self.platform_put(url, &bytes)
    }
}
