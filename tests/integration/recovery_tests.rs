//! Connectivity recovery policy: attempt counting, null-address
//! detection, and the pairing reset that precedes a hard restart.

use washlink::app::ports::ConnectivityPort;
use washlink::adapters::wifi::WifiAdapter;
use washlink::error::ConnectivityFault;
use washlink::recovery::{RecoveryController, RecoveryState, MAX_CONNECT_ATTEMPTS};
use washlink::store::PairingStore;

#[test]
fn ten_failed_attempts_fault_with_the_attempt_count() {
    let mut recovery = RecoveryController::new();

    for n in 1..MAX_CONNECT_ATTEMPTS {
        assert_eq!(recovery.on_attempt_failed(), None, "attempt {n} is tolerated");
    }
    assert_eq!(
        recovery.on_attempt_failed(),
        Some(ConnectivityFault::RetriesExhausted {
            attempts: MAX_CONNECT_ATTEMPTS
        })
    );
}

#[test]
fn null_dhcp_address_is_a_fault() {
    let mut wifi = WifiAdapter::new(Some(washlink::store::WifiCredentials {
        ssid: heapless::String::try_from("LaundryNet").unwrap(),
        password: heapless::String::try_from("washing123").unwrap(),
    }));
    wifi.set_sim_address("0.0.0.0");
    wifi.connect().unwrap();

    let mut recovery = RecoveryController::new();
    let ip = wifi.ip_address().unwrap();
    assert_eq!(
        recovery.check_address(ip.as_str()),
        Some(ConnectivityFault::NullAddress)
    );
    assert!(matches!(recovery.state(), RecoveryState::Faulted(_)));
}

#[test]
fn missing_lease_counts_toward_the_threshold_not_an_instant_fault() {
    let mut wifi = WifiAdapter::new(Some(washlink::store::WifiCredentials {
        ssid: heapless::String::try_from("LaundryNet").unwrap(),
        password: heapless::String::try_from("washing123").unwrap(),
    }));
    // Associated but DHCP never completes.
    wifi.set_sim_address("");
    wifi.connect().unwrap();

    let mut recovery = RecoveryController::new();
    for n in 1..MAX_CONNECT_ATTEMPTS {
        // The wait loop sees no address and records a failed attempt.
        assert_eq!(wifi.ip_address(), None);
        assert_eq!(recovery.on_attempt_failed(), None, "attempt {n} retries");
    }
    assert_eq!(
        recovery.on_attempt_failed(),
        Some(ConnectivityFault::RetriesExhausted {
            attempts: MAX_CONNECT_ATTEMPTS
        })
    );
}

#[test]
fn usable_address_connects_cleanly() {
    let mut wifi = WifiAdapter::new(Some(washlink::store::WifiCredentials {
        ssid: heapless::String::try_from("LaundryNet").unwrap(),
        password: heapless::String::try_from("washing123").unwrap(),
    }));
    wifi.connect().unwrap();

    let mut recovery = RecoveryController::new();
    let ip = wifi.ip_address().unwrap();
    assert_eq!(recovery.check_address(ip.as_str()), None);
    recovery.on_connected();
    assert_eq!(recovery.state(), RecoveryState::Connected);
}

#[test]
fn missing_credentials_fault_comes_from_the_adapter() {
    let dir = tempfile::tempdir().unwrap();
    let store = PairingStore::new(dir.path());
    assert!(store.read_credentials().is_none());

    let mut wifi = WifiAdapter::new(store.read_credentials());
    assert_eq!(
        wifi.connect(),
        Err(ConnectivityFault::CredentialsMissing)
    );
}

#[test]
fn fault_handling_reset_forces_reprovisioning() {
    let dir = tempfile::tempdir().unwrap();
    let store = PairingStore::new(dir.path());
    std::fs::write(dir.path().join("wifi.dat"), "LaundryNet;washing123\n").unwrap();
    assert!(store.credentials_present());

    // What main does once RetriesExhausted comes back.
    store.reset_pairing().unwrap();

    assert!(!store.credentials_present());
    let marker = store.load_marker().unwrap();
    assert_eq!(marker.version, 0);
    assert!(!marker.paired);

    // Next boot reads no credentials and faults immediately.
    let mut wifi = WifiAdapter::new(store.read_credentials());
    assert_eq!(
        wifi.connect(),
        Err(ConnectivityFault::CredentialsMissing)
    );
}
