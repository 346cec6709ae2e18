//! Device identity derived from the ESP32 factory MAC address.
//!
//! The serial number is the full 6-byte eFuse MAC in uppercase hex
//! (`A0B1C2D3E4F5`) — stable across reboots, unique per unit, and the
//! path component of every control-server URL.  If the eFuse read fails
//! the firmware keeps running under a fixed sentinel so the device still
//! shows up server-side (flagged, not silently absent).

/// Serial string: 12 hex chars, or the sentinel.
pub type SerialString = heapless::String<16>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Reported when the hardware identifier cannot be read.
pub const UNKNOWN_SERIAL: &str = "UNKNOWN_SERIAL";

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> Option<MacAddress> {
    let mut mac: MacAddress = [0u8; 6];
    let ret = unsafe { esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr()) };
    if ret == esp_idf_svc::sys::ESP_OK { Some(mac) } else { None }
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> Option<MacAddress> {
    Some([0xA0, 0xB1, 0xC2, 0xD3, 0xE4, 0xF5])
}

/// Derive the serial number: uppercase hex of all 6 MAC bytes, or
/// [`UNKNOWN_SERIAL`] when no MAC is available.
pub fn serial_number(mac: Option<&MacAddress>) -> SerialString {
    let mut serial = SerialString::new();
    use core::fmt::Write;
    match mac {
        Some(mac) => {
            for byte in mac {
                let _ = write!(serial, "{byte:02X}");
            }
        }
        None => {
            let _ = serial.push_str(UNKNOWN_SERIAL);
        }
    }
    serial
}
