//! Sensor node duty cycle
//!
//! A node wakes up, spends an *active window* sampling its sensors and
//! publishing one EPCIS event per sample, then goes back to sleep. The
//! board owns the outer loop (link bring-up, disconnect, sleep); this
//! module owns what happens inside the window.

use core::future::Future;

use hal_abstractions::{Clock, DelayNs, SensorSource, SerialChannel, WallClock};

use crate::epcis::{self, DeviceInfo, PayloadError};
use crate::expresslink::{ExpressLink, LinkError};

/// Default publish topic
pub const DEFAULT_TOPIC: &str = "knowgraph/events";

/// Anything that can carry a payload to the cloud
pub trait Publisher {
    /// Publish `payload` on `topic`
    fn publish(
        &mut self,
        topic: &str,
        payload: &str,
    ) -> impl Future<Output = Result<(), LinkError>>;
}

impl<C, K, D> Publisher for ExpressLink<C, K, D>
where
    C: SerialChannel,
    K: Clock,
    D: DelayNs,
{
    async fn publish(&mut self, topic: &str, payload: &str) -> Result<(), LinkError> {
        ExpressLink::publish(self, topic, payload).await
    }
}

/// Timing of one wake/sleep cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DutyCycle {
    /// Time between samples inside the active window
    pub read_interval_ms: u32,
    /// Length of the active window
    pub active_window_ms: u32,
    /// Sleep between active windows
    pub sleep_secs: u32,
}

impl Default for DutyCycle {
    fn default() -> Self {
        Self {
            read_interval_ms: 5_000,
            active_window_ms: 30_000,
            sleep_secs: 300,
        }
    }
}

/// Node configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// Topic every event is published on
    pub topic: &'static str,
    /// Identity embedded in every event
    pub device: DeviceInfo,
    /// Wake/sleep timing
    pub duty_cycle: DutyCycle,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC,
            device: DeviceInfo::default(),
            duty_cycle: DutyCycle::default(),
        }
    }
}

/// Why a report was not delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NodeError {
    /// Sensor snapshot unusable; nothing was published
    Sensor,
    /// Event could not be serialized
    Payload(PayloadError),
    /// Transport failure
    Link(LinkError),
}

impl From<PayloadError> for NodeError {
    fn from(e: PayloadError) -> Self {
        Self::Payload(e)
    }
}

impl From<LinkError> for NodeError {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

impl core::fmt::Display for NodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Sensor => write!(f, "Sensor read failed"),
            Self::Payload(e) => write!(f, "{}", e),
            Self::Link(e) => write!(f, "{}", e),
        }
    }
}

impl core::error::Error for NodeError {}

/// Outcome of one active window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WindowSummary {
    /// Events delivered
    pub published: u32,
    /// Samples that did not end in a delivered event
    pub failed: u32,
}

/// Samples sensors and publishes EPCIS events
pub struct SensorNode<S, W> {
    sensors: S,
    wall_clock: W,
    config: NodeConfig,
}

impl<S, W> SensorNode<S, W>
where
    S: SensorSource,
    W: WallClock,
{
    pub fn new(sensors: S, wall_clock: W, config: NodeConfig) -> Self {
        Self {
            sensors,
            wall_clock,
            config,
        }
    }

    /// Take one sample and publish it
    ///
    /// A failed sensor read skips the publish entirely.
    pub async fn report_once<P: Publisher>(&mut self, publisher: &mut P) -> Result<(), NodeError> {
        let readings = self.sensors.read().map_err(|_| {
            warn!("Failed to read sensors, skipping report");
            NodeError::Sensor
        })?;

        let payload = epcis::build_event(&self.config.device, &readings, self.wall_clock.unix_secs())?;
        publisher.publish(self.config.topic, payload.as_str()).await?;

        info!("Published {} byte event to {}", payload.len(), self.config.topic);
        Ok(())
    }

    /// Report now, then once per read interval until the window closes
    ///
    /// Samples are scheduled from the window start, so a slow publish
    /// shifts nothing; slots that a publish overran are skipped.
    pub async fn run_active_window<P, K, D>(
        &mut self,
        publisher: &mut P,
        clock: &K,
        delay: &mut D,
    ) -> WindowSummary
    where
        P: Publisher,
        K: Clock,
        D: DelayNs,
    {
        let DutyCycle {
            read_interval_ms,
            active_window_ms,
            ..
        } = self.config.duty_cycle;
        let interval = u64::from(read_interval_ms.max(1));
        let window = u64::from(active_window_ms);

        let start = clock.now_ms();
        let mut summary = WindowSummary::default();

        loop {
            match self.report_once(publisher).await {
                Ok(()) => summary.published += 1,
                Err(e) => {
                    warn!("Report failed: {}", e);
                    summary.failed += 1;
                }
            }

            let elapsed = clock.now_ms().saturating_sub(start);
            let next = (elapsed / interval + 1) * interval;
            if next >= window {
                break;
            }
            // Bounded by the window length, which is a u32
            delay.delay_ms((next - elapsed) as u32).await;
        }

        info!(
            "Active window closed: {} published, {} failed",
            summary.published,
            summary.failed
        );
        summary
    }
}
