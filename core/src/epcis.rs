//! GS1 EPCIS 2.0 sensor events
//!
//! Each report is a complete `EPCISDocument` holding a single
//! `ObjectEvent` that observes the node itself (identified by an SGTIN
//! EPC) and carries the readings in a `sensorElementList`.
//!
//! The document is written straight into a fixed-capacity string; there
//! is no intermediate JSON tree.

use core::fmt::Write;

use hal_abstractions::SensorReadings;
use heapless::String;

use crate::calendar;

/// Largest serialized document
pub const PAYLOAD_CAPACITY: usize = 1536;

/// Largest device EPC suffix
pub const EPC_CAPACITY: usize = 32;

/// Value reported for a probe that did not answer
pub const PROBE_DISCONNECTED: f32 = -999.0;

const CONTEXT: &str = "https://ref.gs1.org/standards/epcis/2.0.0/epcis-context.jsonld";
const EPC_PREFIX: &str = "urn:epc:id:sgtin:0614141.";
const BIZ_STEP: &str = "urn:epcglobal:cbv:bizstep:sensor_reporting";
const DISPOSITION: &str = "urn:epcglobal:cbv:disp:in_transit";

/// Serialized EPCIS document
pub type Payload = String<PAYLOAD_CAPACITY>;

/// Payload construction errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PayloadError {
    /// Document larger than [`PAYLOAD_CAPACITY`]
    Overflow,
}

impl core::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Overflow => write!(f, "EPCIS payload too large"),
        }
    }
}

impl core::error::Error for PayloadError {}

/// Identity of the reporting node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Serial part of the node's SGTIN EPC, also used as sensor device ID
    pub epc: String<EPC_CAPACITY>,
    /// Human-readable hardware model
    pub model: &'static str,
    /// Firmware version string
    pub firmware_version: &'static str,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        let mut epc = String::new();
        // Fits: the literal is shorter than EPC_CAPACITY
        let _ = epc.push_str("KG-NODE-001");
        Self {
            epc,
            model: "Feather STM32F405 ExpressLink Node",
            firmware_version: env!("CARGO_PKG_VERSION"),
        }
    }
}

impl DeviceInfo {
    /// Build device info with the given EPC and default model strings
    ///
    /// An EPC longer than [`EPC_CAPACITY`] is truncated.
    pub fn with_epc(epc: &str) -> Self {
        let mut info = Self::default();
        info.epc.clear();
        for c in epc.chars() {
            if info.epc.push(c).is_err() {
                break;
            }
        }
        info
    }
}

/// Build the EPCIS document for one set of readings
///
/// # Arguments
///
/// * `device` - Node identity
/// * `readings` - Sensor snapshot; missing air temperature or humidity
///   readings are left out, a missing probe reports [`PROBE_DISCONNECTED`]
/// * `unix_secs` - Observation time, used for every timestamp field
///
/// # Example
///
/// ```
/// use hal_abstractions::SensorReadings;
/// use iot_core::epcis::{build_event, DeviceInfo};
///
/// let readings = SensorReadings {
///     air_temp_c: Some(21.5),
///     probe_temp_c: None,
///     humidity_pct: Some(40.0),
/// };
/// let doc = build_event(&DeviceInfo::default(), &readings, 1_700_000_000).unwrap();
/// assert!(doc.contains("\"eventTime\":\"2023-11-14T22:13:20Z\""));
/// ```
pub fn build_event(
    device: &DeviceInfo,
    readings: &SensorReadings,
    unix_secs: u64,
) -> Result<Payload, PayloadError> {
    let mut out = Payload::new();
    write_event(&mut out, device, readings, unix_secs).map_err(|_| PayloadError::Overflow)?;
    Ok(out)
}

fn write_event(
    out: &mut Payload,
    device: &DeviceInfo,
    readings: &SensorReadings,
    unix_secs: u64,
) -> core::fmt::Result {
    let timestamp = calendar::format_iso8601(unix_secs);
    let timestamp = timestamp.as_str();

    write!(
        out,
        "{{\"@context\":\"{CONTEXT}\",\"type\":\"EPCISDocument\",\"schemaVersion\":\"2.0\",\
         \"creationDate\":\"{timestamp}\",\"epcisBody\":{{\"eventList\":[{{\
         \"eventType\":\"ObjectEvent\",\"eventTime\":\"{timestamp}\",\
         \"eventTimeZoneOffset\":\"+00:00\",\"recordTime\":\"{timestamp}\",\"epcList\":["
    )?;

    out.write_char('"')?;
    out.write_str(EPC_PREFIX)?;
    write_escaped(out, &device.epc)?;
    out.write_char('"')?;

    write!(
        out,
        "],\"action\":\"OBSERVE\",\"bizStep\":\"{BIZ_STEP}\",\"disposition\":\"{DISPOSITION}\",\
         \"sensorElementList\":[{{\"sensorMetadata\":{{\"time\":\"{timestamp}\",\"deviceID\":"
    )?;
    write_string(out, &device.epc)?;
    out.write_str(",\"deviceMetadata\":\"")?;
    write_escaped(out, device.model)?;
    out.write_str(" (fw ")?;
    write_escaped(out, device.firmware_version)?;
    out.write_str(")\"},\"sensorReport\":[")?;

    let probe = readings
        .probe_temp_c
        .filter(|t| t.is_finite())
        .unwrap_or(PROBE_DISCONNECTED);

    let mut first = true;
    if let Some(t) = readings.air_temp_c {
        write_report(out, &mut first, "gs1:Temperature", t, "CEL", "air")?;
    }
    write_report(out, &mut first, "gs1:Temperature", probe, "CEL", "probe")?;
    if let Some(h) = readings.humidity_pct {
        write_report(out, &mut first, "gs1:RelativeHumidity", h, "A93", "air")?;
    }

    out.write_str("]}]}]}}")
}

fn write_report(
    out: &mut Payload,
    first: &mut bool,
    kind: &str,
    value: f32,
    uom: &str,
    component: &str,
) -> core::fmt::Result {
    // JSON has no NaN or infinity
    if !value.is_finite() {
        return Ok(());
    }
    if !*first {
        out.write_char(',')?;
    }
    *first = false;
    write!(
        out,
        "{{\"type\":\"{kind}\",\"value\":{value:.1},\"uom\":\"{uom}\",\"component\":\"{component}\"}}"
    )
}

fn write_string(out: &mut Payload, s: &str) -> core::fmt::Result {
    out.write_char('"')?;
    write_escaped(out, s)?;
    out.write_char('"')
}

fn write_escaped(out: &mut Payload, s: &str) -> core::fmt::Result {
    for c in s.chars() {
        match c {
            '"' => out.write_str("\\\"")?,
            '\\' => out.write_str("\\\\")?,
            '\n' => out.write_str("\\n")?,
            '\r' => out.write_str("\\r")?,
            '\t' => out.write_str("\\t")?,
            c if u32::from(c) < 0x20 => write!(out, "\\u{:04x}", u32::from(c))?,
            c => out.write_char(c)?,
        }
    }
    Ok(())
}
