//! ExpressLink link configuration

use hal_abstractions::LineConfig;

/// Maximum command length in bytes, terminator excluded
///
/// Sized for `AT+SEND <topic> <escaped EPCIS event>`.
pub const COMMAND_CAPACITY: usize = 2048;

/// Maximum response line length in bytes, terminator included
///
/// A received message can be as large as anything this node may publish.
pub const RESPONSE_CAPACITY: usize = COMMAND_CAPACITY;

/// Sleep between read attempts while no byte is available
pub const POLL_INTERVAL_MS: u32 = 10;

/// Timing and line settings for one ExpressLink module
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkConfig {
    /// Serial line the board opens before handing over the channel
    pub line: LineConfig,
    /// Power-up settling delay before the liveness probe
    pub settle_ms: u32,
    /// Liveness probe (`AT`) bound
    pub probe_timeout_ms: u64,
    /// Bound for the identity and status queries issued by `initialize`
    pub init_query_timeout_ms: u64,
    /// Connect-initiate (`AT+CONNECT`) bound
    pub connect_timeout_ms: u64,
    /// Number of status polls after a connect-initiate
    pub connect_poll_attempts: u32,
    /// Sleep between unconfirmed status polls
    pub connect_poll_interval_ms: u32,
    /// Status query (`AT+CONNECT?`) bound
    pub status_timeout_ms: u64,
    /// Disconnect bound
    pub disconnect_timeout_ms: u64,
    /// Publish (`AT+SEND`) bound
    pub publish_timeout_ms: u64,
    /// Subscribe bound
    pub subscribe_timeout_ms: u64,
    /// Message poll (`AT+GET`) bound
    pub receive_timeout_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            line: LineConfig::default(),
            settle_ms: 1000,
            probe_timeout_ms: 1000,
            init_query_timeout_ms: 2000,
            connect_timeout_ms: 2000,
            connect_poll_attempts: 30,
            connect_poll_interval_ms: 1000,
            status_timeout_ms: 1000,
            disconnect_timeout_ms: 2000,
            publish_timeout_ms: 5000,
            subscribe_timeout_ms: 2000,
            receive_timeout_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LinkConfig::default();
        assert_eq!(config.line.baud_rate, 115_200);
        assert_eq!(config.probe_timeout_ms, 1000);
        assert_eq!(config.connect_poll_attempts, 30);
        assert_eq!(config.publish_timeout_ms, 5000);
    }

    #[test]
    fn test_response_holds_any_command() {
        assert!(RESPONSE_CAPACITY >= COMMAND_CAPACITY);
    }
}
