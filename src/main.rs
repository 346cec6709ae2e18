//! WashLink Controller — Main Entry Point
//!
//! Hexagonal architecture with a single-threaded blocking control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  WasherAdapter     HttpClientAdapter   WifiAdapter             │
//! │  (WasherPort)      (HttpPort)          (ConnectivityPort)      │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            ControlService (pure logic)                 │    │
//! │  │  command parse · dispatch · ack · status report        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Updater (stage/promote) · RecoveryController (reset policy)   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Boot order matters: staged component files are promoted before the
//! network stack comes up, so a power cut during boot can never leave a
//! half-applied update running against a live server.
#![deny(unused_must_use)]

// ── Module declarations ───────────────────────────────────────
pub mod config;
mod error;
mod pins;
mod recovery;
mod store;
mod update;

pub mod app;
mod adapters;
mod drivers;

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use log::{error, info, warn};

use adapters::device_id;
use adapters::http::HttpClientAdapter;
use adapters::system;
use adapters::washer::WasherAdapter;
use adapters::wifi::WifiAdapter;
use app::ports::{ConnectivityPort, WasherPort};
use app::service::{ControlService, Disposition, StatusPayload};
use config::SystemConfig;
use drivers::button::{ButtonEvent, ResetButton};
use drivers::status_led::StatusLed;
use drivers::watchdog::Watchdog;
use error::{ConnectivityFault, Error};
use recovery::RecoveryController;
use store::{PairingMarker, PairingStore};
use update::Updater;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  WashLink v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let fault = run();

    // Reset table: every fault class that escapes the control loop ends
    // in a hardware reset.  Exhaustive on purpose — adding an error
    // variant forces a decision here.
    match fault {
        Error::Http(e) => error!("fatal: http: {e}"),
        Error::Parse(e) => error!("fatal: parse: {e}"),
        Error::Stage(e) => error!("fatal: stage: {e}"),
        Error::Promote(e) => error!("fatal: promote: {e}"),
        Error::Store(e) => error!("fatal: store: {e}"),
        Error::Washer(e) => error!("fatal: washer bus: {e}"),
        Error::Connectivity(e) => error!("fatal: connectivity: {e}"),
        Error::Init(msg) => error!("fatal: init: {msg}"),
    }
    system::sleep_secs(1);
    system::device_reset()
}

/// Boot, connect, and run the control loop.  Only returns on a fatal
/// fault; `main` maps the fault to a reset.
fn run() -> Error {
    // ── 2. Config ─────────────────────────────────────────────
    let default_dir = SystemConfig::default().data_dir;
    let config = SystemConfig::load_or_default(&default_dir);
    if let Err(e) = config.validate() {
        return e;
    }

    // ── 3. Promote staged updates before anything can fail ────
    //
    // A failed rename is logged and boot continues with the previously
    // active components; resetting here would just loop on the same
    // filesystem fault.
    let updater = Updater::new(config.data_dir.as_str(), config.max_update_bytes);
    if let Err(e) = updater.promote_all() {
        warn!("update: promotion failed ({e}), keeping active components");
    }

    // ── 4. Hardware peripherals ───────────────────────────────
    if let Err(e) = drivers::hw_init::init_peripherals() {
        error!("hw: peripheral init failed: {e}");
        return Error::Init("gpio init failed");
    }
    if let Err(e) = drivers::hw_init::init_isr_service() {
        // Losing the reset button is survivable; the control loop is not
        // affected.
        warn!("hw: ISR service init failed ({e}), reset button disabled");
    }
    let watchdog = Watchdog::new(config.watchdog_budget_secs());
    let mut led = StatusLed::new();
    let mut button = ResetButton::new(config.button_debounce_ms);

    // ── 5. Pairing store + device identity ────────────────────
    let store = PairingStore::new(config.data_dir.as_str());
    match store.load_marker() {
        Ok(marker) => info!(
            "pairing: marker v{} paired={}",
            marker.version, marker.paired
        ),
        Err(e) => warn!("pairing: marker unreadable ({e}), treating as unpaired"),
    }

    let mac = device_id::read_mac();
    let serial = device_id::serial_number(mac.as_ref());
    info!("device serial: {serial}");

    // ── 6. WiFi association wait loop ─────────────────────────
    let mut recovery = RecoveryController::new();
    let mut wifi = WifiAdapter::new(store.read_credentials());

    let ip: String = loop {
        match wifi.connect() {
            Ok(()) => {
                if let Some(addr) = wifi.ip_address() {
                    if let Some(fault) = recovery.check_address(addr.as_str()) {
                        return fault.into();
                    }
                    recovery.on_connected();
                    break addr.as_str().to_owned();
                }
                // Associated but no lease yet; counts as a failed check.
            }
            Err(fault @ ConnectivityFault::CredentialsMissing) => {
                recovery.on_credentials_missing();
                return fault.into();
            }
            Err(_) => {}
        }

        if !store.credentials_present() {
            // File removed mid-wait (field tech over the console); there
            // is nothing left to retry against.
            let fault = recovery.on_credentials_missing();
            return fault.into();
        }
        if let Some(fault) = recovery.on_attempt_failed() {
            // Ten strikes: assume the stored network is gone for good and
            // clear pairing so the next boot re-provisions.
            if let Err(e) = store.reset_pairing() {
                warn!("pairing: reset failed during fault handling: {e}");
            }
            return fault.into();
        }
        warn!(
            "wifi: not associated (attempt {}/{}), retrying in {}s",
            recovery.attempts(),
            recovery::MAX_CONNECT_ATTEMPTS,
            config.connect_retry_secs
        );
        watchdog.feed();
        system::sleep_secs(config.connect_retry_secs);
    };
    info!("wifi: connected, ip {ip}");

    if let Err(e) = store.save_marker(&PairingMarker {
        version: store::MARKER_VERSION,
        paired: true,
    }) {
        warn!("pairing: marker update failed: {e}");
    }

    // ── 7. Appliance bus + control service ────────────────────
    let mut washer = match WasherAdapter::new() {
        Ok(w) => w,
        Err(e) => return e.into(),
    };
    let mut http = HttpClientAdapter::new(config.http_timeout_secs, config.max_update_bytes);
    let mut service = ControlService::new(&config, serial.as_str());
    info!("control: polling {}", service.poll_url());

    // ── 8. Control loop ───────────────────────────────────────
    loop {
        led.on();

        let status = match washer.get_machine_status() {
            Ok(v) => v,
            Err(e) => {
                // A dead bus is reported, not fatal; the server decides
                // whether to dispatch maintenance.
                warn!("washer: status read failed: {e}");
                serde_json::json!({ "error": format!("{e}") })
            }
        };
        let payload = StatusPayload {
            ip: ip.clone(),
            client_id: serial.as_str().to_owned(),
            status,
        };

        let disposition = match service.poll_and_dispatch(&payload, &mut http, &mut washer) {
            Ok(d) => d,
            Err(e) => {
                // Transient by policy: re-poll next iteration.
                warn!("poll: {e}");
                Disposition::Continue
            }
        };

        led.off();
        watchdog.feed();

        if let Some(ButtonEvent::Pressed) = button.tick(system::uptime_ms()) {
            info!("button: confirmed press, clearing pairing");
            led.blink(3);
            if let Err(e) = store.reset_pairing() {
                warn!("pairing: reset failed: {e}");
            }
            system::device_reset();
        }

        match disposition {
            Disposition::Continue => system::sleep_ms(config.poll_interval_ms),
            Disposition::Settle => system::sleep_ms(config.settle_delay_ms),
            Disposition::Reboot { delay_secs } => {
                info!("reboot: restarting in {delay_secs}s");
                system::sleep_secs(delay_secs);
                system::device_reset();
            }
        }
    }
}
