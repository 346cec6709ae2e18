//! End-to-end poll/dispatch cycles through [`ControlService`] with
//! scripted HTTP and a recording washer mock.
//!
//! Covers the full command vocabulary plus the acknowledgment and
//! staging contracts: every dispatched command acks exactly once, acks
//! go to `{device_url}/command`, and updates stage without touching the
//! active file mid-session.

use serde_json::json;
use washlink::app::service::{ControlService, Disposition, StatusPayload};
use washlink::config::SystemConfig;
use washlink::error::{HttpError, PollError};

use crate::mock_hw::{HttpCall, MockHttp, MockWasher, WasherCall};

const SERIAL: &str = "A0B1C2D3E4F5";

fn config_in(dir: &tempfile::TempDir) -> SystemConfig {
    SystemConfig {
        data_dir: dir.path().to_str().unwrap().to_string(),
        ..SystemConfig::default()
    }
}

fn payload() -> StatusPayload {
    StatusPayload {
        ip: "192.168.4.17".into(),
        client_id: SERIAL.into(),
        status: json!({ "state": "idle" }),
    }
}

/// Script one poll cycle whose GET answers `body`.
fn poll_with(
    service: &mut ControlService,
    washer: &mut MockWasher,
    body: &str,
) -> (Disposition, MockHttp) {
    let mut http = MockHttp::new();
    http.push_response(200, body.as_bytes());
    let d = service
        .poll_and_dispatch(&payload(), &mut http, washer)
        .expect("cycle must not error");
    (d, http)
}

// ── Command vocabulary ────────────────────────────────────────

#[test]
fn coins_command_credits_machine_and_settles() {
    let dir = tempfile::tempdir().unwrap();
    let mut service = ControlService::new(&config_in(&dir), SERIAL);
    let mut washer = MockWasher::new();

    let (d, http) = poll_with(
        &mut service,
        &mut washer,
        r#"{"command":{"key":"coins","value":"5"}}"#,
    );

    assert_eq!(d, Disposition::Settle);
    assert_eq!(washer.calls, vec![WasherCall::AddCoins(5)]);
    // Exactly one ack, to the command sub-resource.
    assert_eq!(
        http.put_urls(),
        vec![format!("http://34.124.162.209/api-wash/{SERIAL}/command").as_str()]
    );
}

#[test]
fn menu_and_start_drive_the_bus() {
    let dir = tempfile::tempdir().unwrap();
    let mut service = ControlService::new(&config_in(&dir), SERIAL);
    let mut washer = MockWasher::new();

    let (d, _) = poll_with(
        &mut service,
        &mut washer,
        r#"{"command":{"key":"menu","value":3}}"#,
    );
    assert_eq!(d, Disposition::Continue);

    let (d, _) = poll_with(&mut service, &mut washer, r#"{"command":{"key":"start"}}"#);
    assert_eq!(d, Disposition::Settle);

    assert_eq!(
        washer.calls,
        vec![WasherCall::SelectProgram(3), WasherCall::Start]
    );
}

#[test]
fn raw_register_write_passes_address_and_value() {
    let dir = tempfile::tempdir().unwrap();
    let mut service = ControlService::new(&config_in(&dir), SERIAL);
    let mut washer = MockWasher::new();

    let (d, _) = poll_with(
        &mut service,
        &mut washer,
        r#"{"command":{"key":"command","address":514,"value":"7"}}"#,
    );

    assert_eq!(d, Disposition::Settle);
    assert_eq!(
        washer.calls,
        vec![WasherCall::SendCommand {
            address: 514,
            value: 7
        }]
    );
}

#[test]
fn reboot_command_acks_before_requesting_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let mut service = ControlService::new(&config, SERIAL);
    let mut washer = MockWasher::new();

    let (d, http) = poll_with(&mut service, &mut washer, r#"{"command":{"key":"reboot"}}"#);

    assert_eq!(
        d,
        Disposition::Reboot {
            delay_secs: config.reboot_delay_secs
        }
    );
    assert_eq!(http.put_urls().len(), 1);
    assert!(washer.calls.is_empty());
}

// ── Update staging ────────────────────────────────────────────

#[test]
fn update_stages_file_without_touching_active_and_requests_reboot() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("main"), b"v1-active").unwrap();

    let mut service = ControlService::new(&config_in(&dir), SERIAL);
    let mut washer = MockWasher::new();

    let mut http = MockHttp::new();
    http.push_response(200, br#"{"command":{"key":"update_main","value":"http://host/fw/main-v2"}}"#);
    http.push_response(200, b"v2-image");

    let d = service
        .poll_and_dispatch(&payload(), &mut http, &mut washer)
        .unwrap();

    assert_eq!(d, Disposition::Reboot { delay_secs: 0 });
    // Download hit the URL from the command, not the control endpoint.
    assert_eq!(http.get_urls()[1], "http://host/fw/main-v2");
    // Staged beside the active file, which is untouched mid-session.
    assert_eq!(
        std::fs::read(dir.path().join("main.staged")).unwrap(),
        b"v2-image"
    );
    assert_eq!(std::fs::read(dir.path().join("main")).unwrap(), b"v1-active");
    // Two-phase write left no .part debris behind.
    assert!(!dir.path().join("main.staged.part").exists());
    assert_eq!(http.put_urls().len(), 1);
}

#[test]
fn update_404_stages_nothing_but_still_acks() {
    let dir = tempfile::tempdir().unwrap();
    let mut service = ControlService::new(&config_in(&dir), SERIAL);
    let mut washer = MockWasher::new();

    let mut http = MockHttp::new();
    http.push_response(200, br#"{"command":{"key":"update_wash","value":"http://host/fw/gone"}}"#);
    http.push_response(404, b"not found");

    let d = service
        .poll_and_dispatch(&payload(), &mut http, &mut washer)
        .unwrap();

    assert_eq!(d, Disposition::Continue);
    assert!(!dir.path().join("wash.staged").exists());
    assert_eq!(http.put_urls().len(), 1);
}

#[test]
fn update_download_failure_still_acks_and_continues() {
    let dir = tempfile::tempdir().unwrap();
    let mut service = ControlService::new(&config_in(&dir), SERIAL);
    let mut washer = MockWasher::new();

    let mut http = MockHttp::new();
    http.push_response(200, br#"{"command":{"key":"update_main","value":"http://host/fw/x"}}"#);
    http.push_error(HttpError::Timeout);

    let d = service
        .poll_and_dispatch(&payload(), &mut http, &mut washer)
        .unwrap();

    assert_eq!(d, Disposition::Continue);
    assert!(!dir.path().join("main.staged").exists());
    assert_eq!(http.put_urls().len(), 1);
}

// ── Acknowledgment contract ───────────────────────────────────

#[test]
fn bus_failure_does_not_block_the_ack() {
    let dir = tempfile::tempdir().unwrap();
    let mut service = ControlService::new(&config_in(&dir), SERIAL);
    let mut washer = MockWasher::dead_bus();

    let (d, http) = poll_with(
        &mut service,
        &mut washer,
        r#"{"command":{"key":"coins","value":2}}"#,
    );

    // The attempt was made, it failed, and the server still gets its ack.
    assert_eq!(washer.calls, vec![WasherCall::AddCoins(2)]);
    assert_eq!(http.put_urls().len(), 1);
    assert_eq!(d, Disposition::Settle);
}

#[test]
fn failed_ack_does_not_fail_the_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let mut service = ControlService::new(&config_in(&dir), SERIAL);
    let mut washer = MockWasher::new();

    let mut http = MockHttp::new();
    http.push_response(200, br#"{"command":{"key":"stop"}}"#);
    http.put_result = Err(HttpError::ConnectFailed);

    let d = service
        .poll_and_dispatch(&payload(), &mut http, &mut washer)
        .unwrap();

    // Handler ran; the lost ack just means re-delivery next poll.
    assert_eq!(washer.calls, vec![WasherCall::Stop]);
    assert_eq!(d, Disposition::Settle);
}

#[test]
fn unknown_key_is_acked_as_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let mut service = ControlService::new(&config_in(&dir), SERIAL);
    let mut washer = MockWasher::new();

    let (d, http) = poll_with(
        &mut service,
        &mut washer,
        r#"{"command":{"key":"defrost","value":1}}"#,
    );

    assert_eq!(d, Disposition::Continue);
    assert!(washer.calls.is_empty());
    assert_eq!(http.put_urls().len(), 1);
}

// ── Status reporting ──────────────────────────────────────────

#[test]
fn idle_cycle_puts_status_to_the_device_url() {
    let dir = tempfile::tempdir().unwrap();
    let mut service = ControlService::new(&config_in(&dir), SERIAL);
    let mut washer = MockWasher::new();

    let (d, http) = poll_with(&mut service, &mut washer, r#"{"command":null}"#);

    assert_eq!(d, Disposition::Continue);
    let Some(HttpCall::PutJson { url, body }) = http.calls.last() else {
        panic!("expected a status PUT");
    };
    assert_eq!(url, &format!("http://34.124.162.209/api-wash/{SERIAL}"));
    assert_eq!(body["client_id"], SERIAL);
    assert_eq!(body["ip"], "192.168.4.17");
}

#[test]
fn unreachable_server_still_attempts_degraded_report() {
    let dir = tempfile::tempdir().unwrap();
    let mut service = ControlService::new(&config_in(&dir), SERIAL);
    let mut washer = MockWasher::new();

    let mut http = MockHttp::new();
    http.push_error(HttpError::ConnectFailed);

    let err = service
        .poll_and_dispatch(&payload(), &mut http, &mut washer)
        .unwrap_err();

    assert_eq!(err, PollError::Network(HttpError::ConnectFailed));
    assert_eq!(http.put_urls().len(), 1);
}
