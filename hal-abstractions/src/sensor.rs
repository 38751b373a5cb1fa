//! Environmental sensor acquisition
//!
//! Drivers (DHT11, DS18B20, on-chip temperature sensor, ...) live in the
//! board crates. The node logic only needs one snapshot per cycle.

/// One snapshot of the node's sensors
///
/// A `None` field means the board has no such sensor or the read failed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorReadings {
    /// Ambient air temperature in degrees Celsius
    pub air_temp_c: Option<f32>,
    /// Probe temperature in degrees Celsius
    pub probe_temp_c: Option<f32>,
    /// Relative humidity in percent
    pub humidity_pct: Option<f32>,
}

/// Source of sensor snapshots
pub trait SensorSource {
    /// Acquisition failure
    type Error: core::fmt::Debug;

    /// Take one reading of every attached sensor
    ///
    /// Returning `Err` means the whole snapshot is unusable and the cycle
    /// should be skipped.
    fn read(&mut self) -> Result<SensorReadings, Self::Error>;
}
