//! ExpressLink transport error types

/// ExpressLink operation errors
///
/// None of these are fatal: every operation can be retried by the caller,
/// and a failed publish already dropped the session back to
/// [`LinkState::Initialized`](super::LinkState::Initialized) so the next
/// attempt reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Operation attempted before the required link state
    NotReady,
    /// No terminated, non-blank response line before the deadline
    Timeout,
    /// A response arrived but lacked the expected text (or was not UTF-8)
    UnexpectedResponse,
    /// Only blank lines arrived before the deadline
    EmptyResponse,
    /// Command text contains a line terminator
    InvalidCommand,
    /// Topic is empty or contains whitespace
    InvalidTopic,
    /// Command does not fit the command buffer
    CommandTooLong,
    /// Response line does not fit the response buffer
    ResponseOverflow,
    /// The serial channel reported an I/O error
    Channel,
}

impl core::fmt::Display for LinkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotReady => write!(f, "Link not ready"),
            Self::Timeout => write!(f, "Response timeout"),
            Self::UnexpectedResponse => write!(f, "Unexpected response"),
            Self::EmptyResponse => write!(f, "Empty response"),
            Self::InvalidCommand => write!(f, "Invalid command"),
            Self::InvalidTopic => write!(f, "Invalid topic"),
            Self::CommandTooLong => write!(f, "Command too long"),
            Self::ResponseOverflow => write!(f, "Response overflow"),
            Self::Channel => write!(f, "Serial channel error"),
        }
    }
}

impl core::error::Error for LinkError {}
