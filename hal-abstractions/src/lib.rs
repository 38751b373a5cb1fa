//! Hardware abstraction traits for IoT firmware
//!
//! This crate defines traits that abstract over hardware differences
//! between boards. BSPs implement these traits; the platform-agnostic
//! logic in `iot-core` only ever sees the traits.
//!
//! - **`serial`**: byte-stream duplex to a radio module (`SerialChannel`)
//! - **`time`**: monotonic and wall clocks, plus the async delay re-export
//! - **`sensor`**: environmental sensor acquisition (`SensorSource`)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![cfg_attr(not(test), deny(warnings))]

pub mod sensor;
pub mod serial;
pub mod time;

pub use sensor::{SensorReadings, SensorSource};
pub use serial::{IoChannel, LineConfig, Parity, SerialChannel};
pub use time::{Clock, DelayNs, WallClock};
