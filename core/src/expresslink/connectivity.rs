//! Connectivity state tracking
//!
//! Drives the session through `Uninitialized → Initialized → Connected`
//! using status queries. The driver's view can lag the module's: a dropped
//! cloud session is only noticed on the next failed publish or explicit
//! [`status`](ExpressLink::status) query.

use hal_abstractions::{Clock, DelayNs, SerialChannel};

use super::command::{self, reports_connected};
use super::error::LinkError;
use super::session::{LinkState, LinkStatus};
use super::ExpressLink;

impl<C, K, D> ExpressLink<C, K, D>
where
    C: SerialChannel,
    K: Clock,
    D: DelayNs,
{
    /// Bring the module up and learn its connection state
    ///
    /// This function:
    /// 1. Waits the power-up settling delay
    /// 2. Sends the liveness probe (`AT` → `OK`)
    /// 3. Queries module identity (best effort, logged only)
    /// 4. Queries connection status; an active session goes straight to
    ///    `Connected`
    ///
    /// # Errors
    ///
    /// Returns the probe's error if the module does not answer; the state
    /// is left unchanged.
    pub async fn initialize(&mut self) -> Result<LinkState, LinkError> {
        info!(
            "Initializing ExpressLink ({} baud, {} data bits, {} stop bits)",
            self.config.line.baud_rate, self.config.line.data_bits, self.config.line.stop_bits
        );
        self.engine.pause_ms(self.config.settle_ms).await;

        if let Err(e) = self
            .run_expect(command::AT, command::OK, self.config.probe_timeout_ms)
            .await
        {
            error!("ExpressLink module not responding: {}", e);
            return Err(e);
        }

        match self
            .run(command::CONF_ABOUT, self.config.init_query_timeout_ms)
            .await
        {
            Ok(about) => info!("ExpressLink info: {}", about.as_str()),
            Err(e) => warn!("ExpressLink identity query failed: {}", e),
        }

        let connected = match self
            .run(command::CONNECT_QUERY, self.config.init_query_timeout_ms)
            .await
        {
            Ok(response) => reports_connected(&response),
            Err(e) => {
                warn!("ExpressLink status query failed: {}", e);
                false
            }
        };
        if connected {
            info!("ExpressLink already connected");
        }

        self.session.mark_initialized(connected);
        Ok(self.session.state())
    }

    /// Establish a cloud session
    ///
    /// No-op when already connected. Otherwise sends the connect-initiate
    /// command and polls status once per poll interval until the module
    /// reports a session or the attempts run out.
    ///
    /// # Errors
    ///
    /// - `NotReady` if [`initialize`](Self::initialize) has not succeeded
    /// - the connect-initiate error if the module refuses
    /// - `Timeout` if no poll confirmed the session; state stays
    ///   `Initialized`
    pub async fn connect(&mut self) -> Result<(), LinkError> {
        match self.session.state() {
            LinkState::Connected => return Ok(()),
            LinkState::Uninitialized => return Err(LinkError::NotReady),
            LinkState::Initialized => {}
        }

        info!("Connecting to AWS IoT Core...");
        if let Err(e) = self
            .run_expect(command::CONNECT, command::OK, self.config.connect_timeout_ms)
            .await
        {
            error!("Failed to initiate connection: {}", e);
            return Err(e);
        }

        for attempt in 0..self.config.connect_poll_attempts {
            if let Ok(response) = self
                .run(command::CONNECT_QUERY, self.config.status_timeout_ms)
                .await
            {
                if reports_connected(&response) {
                    self.session.mark_connected();
                    info!("Connected to AWS IoT Core (poll {})", attempt + 1);
                    return Ok(());
                }
            }
            self.engine
                .pause_ms(self.config.connect_poll_interval_ms)
                .await;
        }

        error!(
            "Connection timeout after {} polls",
            self.config.connect_poll_attempts
        );
        Err(LinkError::Timeout)
    }

    /// Drop the cloud session
    ///
    /// # Errors
    ///
    /// - `NotReady` if [`initialize`](Self::initialize) has not succeeded
    /// - the command's error otherwise; tracked state is left unchanged
    ///   even though the module's real state is now unknown
    pub async fn disconnect(&mut self) -> Result<(), LinkError> {
        if !self.session.state().is_initialized() {
            return Err(LinkError::NotReady);
        }

        match self
            .run_expect(
                command::DISCONNECT,
                command::OK,
                self.config.disconnect_timeout_ms,
            )
            .await
        {
            Ok(_) => {
                self.session.drop_connection();
                info!("Disconnected from AWS IoT Core");
                Ok(())
            }
            Err(e) => {
                warn!("Disconnect failed, module state unknown: {}", e);
                Err(e)
            }
        }
    }

    /// Ask the module for its connection status
    ///
    /// Never touches the channel before initialization. Does not change
    /// the tracked state.
    pub async fn status(&mut self) -> LinkStatus {
        if !self.session.state().is_initialized() {
            return LinkStatus::NotInitialized;
        }

        match self
            .run(command::CONNECT_QUERY, self.config.status_timeout_ms)
            .await
        {
            Ok(response) if reports_connected(&response) => LinkStatus::Connected,
            Ok(_) => LinkStatus::Disconnected,
            Err(_) => LinkStatus::Unknown,
        }
    }
}
