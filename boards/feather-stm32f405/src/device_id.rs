//! Node identity from the STM32F405 unique device ID
//!
//! The factory-programmed 96-bit UID is stable across reboots and unique
//! to each chip, which makes it a natural serial number for the node's
//! EPC.

use iot_core::epcis::{DeviceInfo, EPC_CAPACITY};

/// EPC prefix for this board family
const EPC_PREFIX: &str = "KG-F405-";

/// Get the STM32F405 unique device ID as a hex string
///
/// Returns a 24-character hex string representing the 96-bit UID.
pub fn uid_hex() -> &'static str {
    embassy_stm32::uid::uid_hex()
}

/// Generate the node EPC from the device UID
///
/// Format: `KG-F405-{24_hex_chars}` (32 characters, exactly
/// [`EPC_CAPACITY`]).
pub fn node_epc() -> heapless::String<EPC_CAPACITY> {
    let mut epc = heapless::String::new();
    // 8 + 24 bytes, both pushes fit
    let _ = epc.push_str(EPC_PREFIX);
    let _ = epc.push_str(uid_hex());
    epc
}

/// Device identity reported in every event
pub fn device_info() -> DeviceInfo {
    DeviceInfo {
        epc: node_epc(),
        model: "Adafruit Feather STM32F405 + ExpressLink",
        firmware_version: env!("CARGO_PKG_VERSION"),
    }
}
