//! AWS IoT ExpressLink AT-command transport
//!
//! ExpressLink modules hold the TLS session to AWS IoT Core themselves; the
//! host only speaks a line-based AT protocol over a UART. This module
//! layers that protocol:
//!
//! - **`engine`**: bounded command/response over a [`SerialChannel`]
//! - **`session`**: `Uninitialized → Initialized → Connected` state
//! - **`connectivity`**: initialize / connect / disconnect / status
//! - **`pubsub`**: publish / subscribe / receive
//! - **`command`**: the AT command strings and builders
//! - **`config`**: timeouts and buffer capacities
//! - **`error`**: [`LinkError`]
//!
//! # Example
//!
//! ```ignore
//! let mut link = ExpressLink::new(uart, clock, Delay, LinkConfig::default());
//! link.initialize().await?;
//! link.publish("knowgraph/events", payload.as_str()).await?;
//! if let Some(msg) = link.receive().await {
//!     info!("Received: {}", msg.as_str());
//! }
//! ```

pub mod command;
pub mod config;
pub mod connectivity;
pub mod engine;
pub mod error;
pub mod pubsub;
pub mod session;

#[cfg(test)]
pub(crate) mod mock;

use hal_abstractions::{Clock, DelayNs, SerialChannel};

pub use config::LinkConfig;
pub use engine::{CommandEngine, Response};
pub use error::LinkError;
pub use session::{LinkState, LinkStatus};

use session::Session;

/// ExpressLink module driver
///
/// Owns the command engine (and through it the serial channel) and the
/// session state. All operations are sequential and take `&mut self`.
pub struct ExpressLink<C, K, D> {
    engine: CommandEngine<C, K, D>,
    session: Session,
    config: LinkConfig,
}

impl<C, K, D> ExpressLink<C, K, D>
where
    C: SerialChannel,
    K: Clock,
    D: DelayNs,
{
    /// Create a driver for a module on an already-opened channel
    ///
    /// The board opens the UART from `config.line`; no traffic is sent
    /// until [`initialize`](Self::initialize).
    pub fn new(channel: C, clock: K, delay: D, config: LinkConfig) -> Self {
        Self {
            engine: CommandEngine::new(channel, clock, delay),
            session: Session::default(),
            config,
        }
    }

    /// Current session state
    pub fn state(&self) -> LinkState {
        self.session.state()
    }

    /// Does the driver believe a cloud session is active?
    ///
    /// No channel traffic; see [`status`](Self::status) to ask the module.
    pub fn is_connected(&self) -> bool {
        self.session.state().is_connected()
    }

    /// Log every command and response line at debug level
    pub fn set_debug(&mut self, enable: bool) {
        self.session.set_debug(enable);
    }

    /// Borrow the serial channel
    pub fn channel(&self) -> &C {
        self.engine.channel()
    }

    async fn run(&mut self, command: &str, timeout_ms: u64) -> Result<Response, LinkError> {
        self.trace_command(command);
        let result = self.engine.execute(command, timeout_ms).await;
        self.trace_result(command, &result);
        result
    }

    async fn run_expect(
        &mut self,
        command: &str,
        expected: &str,
        timeout_ms: u64,
    ) -> Result<Response, LinkError> {
        self.trace_command(command);
        let result = self
            .engine
            .execute_expect(command, expected, timeout_ms)
            .await;
        self.trace_result(command, &result);
        result
    }

    fn trace_command(&self, command: &str) {
        if self.session.debug() {
            debug!("[ExpressLink] -> {}", command);
        }
    }

    fn trace_result(&self, command: &str, result: &Result<Response, LinkError>) {
        if !self.session.debug() {
            return;
        }
        match result {
            Ok(response) => debug!("[ExpressLink] <- {}", response.as_str()),
            Err(e) => debug!("[ExpressLink] {} failed: {}", command, e),
        }
    }
}
