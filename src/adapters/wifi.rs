//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`] — the hexagonal boundary for network
//! connectivity.  Deliberately thin: it associates with the stored
//! credentials and reports the acquired address.  Retry counting, the
//! ten-strike pairing reset, and the null-address check all belong to
//! [`RecoveryController`](crate::recovery::RecoveryController).
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side tests.

use log::{info, warn};

use crate::app::ports::ConnectivityPort;
use crate::error::ConnectivityFault;
use crate::store::WifiCredentials;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting,
    Connected,
}

pub struct WifiAdapter {
    state: WifiState,
    credentials: Option<WifiCredentials>,
    /// Simulation: address handed to the adapter by the test.
    #[cfg(not(target_os = "espidf"))]
    sim_address: heapless::String<16>,
}

impl WifiAdapter {
    pub fn new(credentials: Option<WifiCredentials>) -> Self {
        Self {
            state: WifiState::Disconnected,
            credentials,
            #[cfg(not(target_os = "espidf"))]
            sim_address: heapless::String::try_from("192.168.4.17").unwrap_or_default(),
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    /// Simulation control: address reported once connected.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_sim_address(&mut self, ip: &str) {
        self.sim_address = heapless::String::try_from(ip).unwrap_or_default();
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self, creds: &WifiCredentials) -> Result<(), ConnectivityFault> {
        // ESP-IDF WiFi STA association.
        //
        // The full wiring requires:
        // 1. EspWifi::new(peripherals.modem, sysloop, nvs)
        // 2. wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        //        ssid: creds.ssid.as_str().try_into()?,
        //        password: creds.password.as_str().try_into()?,
        //        auth_method: AuthMethod::WPA2Personal,
        //        ..Default::default()
        //    }))
        // 3. wifi.start()
        // 4. wifi.connect()
        //
        // The EspWifi handle will be threaded in from main() when the
        // modem peripheral is taken there.  Until then this reports
        // success without a real association, and platform_address()
        // carries the truth: no netif or a null lease reads as "no
        // address yet", which the wait loop counts as a failed attempt
        // instead of trusting our state.
        info!("wifi(espidf): STA connect deferred until peripheral wiring ('{}')", creds.ssid);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self, creds: &WifiCredentials) -> Result<(), ConnectivityFault> {
        info!("wifi(sim): associated with '{}'", creds.ssid);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_address(&self) -> Option<heapless::String<16>> {
        use esp_idf_svc::sys::{esp_netif_get_handle_from_ifkey, esp_netif_get_ip_info, esp_netif_ip_info_t};

        // SAFETY: the default STA netif exists after platform_connect();
        // esp_netif_get_ip_info only writes into the provided struct.
        unsafe {
            let netif = esp_netif_get_handle_from_ifkey(c"WIFI_STA_DEF".as_ptr());
            if netif.is_null() {
                return None;
            }
            let mut info = esp_netif_ip_info_t::default();
            if esp_netif_get_ip_info(netif, &mut info) != esp_idf_svc::sys::ESP_OK {
                return None;
            }
            // Pre-DHCP the netif reports 0.0.0.0 — that's "no lease yet",
            // not an address; the wait loop retries on None.
            if info.ip.addr == 0 {
                return None;
            }
            let octets = info.ip.addr.to_le_bytes();
            let mut ip = heapless::String::new();
            use core::fmt::Write;
            let _ = write!(ip, "{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3]);
            Some(ip)
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_address(&self) -> Option<heapless::String<16>> {
        // Empty sim address models a station with no lease yet.
        if self.sim_address.is_empty() {
            return None;
        }
        Some(self.sim_address.clone())
    }
}

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self) -> Result<(), ConnectivityFault> {
        let Some(creds) = self.credentials.clone() else {
            warn!("wifi: no credentials stored");
            return Err(ConnectivityFault::CredentialsMissing);
        };
        self.state = WifiState::Connecting;
        self.platform_connect(&creds)?;
        self.state = WifiState::Connected;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state == WifiState::Connected
    }

    fn ip_address(&self) -> Option<heapless::String<16>> {
        if self.state != WifiState::Connected {
            return None;
        }
        self.platform_address()
    }
}
