//! Platform-agnostic core logic for IoT firmware
//!
//! This crate contains business logic that can be shared across all
//! supported boards and tiers. It has NO hardware dependencies: boards hand
//! in implementations of the `hal-abstractions` traits.
//!
//! - **`expresslink`**: AT-command transport for AWS IoT ExpressLink modules
//! - **`epcis`**: GS1 EPCIS 2.0 traceability event payloads
//! - **`calendar`**: Unix time ⇄ civil date conversions and ISO 8601 output
//! - **`node`**: sensor node duty cycle (sample, publish, sleep)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![cfg_attr(not(test), deny(warnings))]

#[macro_use]
mod fmt;

pub mod calendar;
pub mod epcis;
pub mod expresslink;
pub mod node;

pub use expresslink::{ExpressLink, LinkConfig, LinkError, LinkState, LinkStatus};
pub use node::{NodeConfig, NodeError, Publisher, SensorNode};
