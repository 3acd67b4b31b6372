pub mod mock_raop_server;
#[cfg(feature = "receiver")]
pub mod mock_sender;
pub mod mock_server;
pub mod network_sim;

use crate::types::{AirPlayDevice, DeviceCapabilities};
use std::collections::HashMap;
use std::net::IpAddr;

/// Helper to create an `AirPlayDevice` for testing.
///
/// This bypasses discovery and directly populates fields, including private ones.
#[must_use]
pub fn create_test_device(id: &str, name: &str, address: IpAddr, port: u16) -> AirPlayDevice {
    AirPlayDevice {
        id: id.to_string(),
        name: name.to_string(),
        model: Some("TestModel".to_string()),
        address,
        port,
        capabilities: DeviceCapabilities::default(),
        txt_records: HashMap::new(),
    }
}
