//! Link session state
//!
//! One explicit state value replaces a pair of `initialized`/`connected`
//! flags, so "connected but not initialized" cannot be represented.

/// Connectivity of the ExpressLink module as last observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Liveness probe has not passed yet
    #[default]
    Uninitialized,
    /// Module answers, no cloud session
    Initialized,
    /// Module reports an active cloud session
    Connected,
}

impl LinkState {
    /// Has the module passed a liveness check?
    pub fn is_initialized(self) -> bool {
        !matches!(self, Self::Uninitialized)
    }

    /// Does the module hold an active session?
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Coarse status report, as returned by `ExpressLink::status`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkStatus {
    /// `initialize` has not succeeded; the module was not queried
    NotInitialized,
    /// Module reports an active session
    Connected,
    /// Module reports no session
    Disconnected,
    /// The status query itself failed
    Unknown,
}

impl core::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "Not initialized"),
            Self::Connected => write!(f, "Connected"),
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Unknown => write!(f, "Status unknown"),
        }
    }
}

/// Session owned by the facade
///
/// Transitions are the only way to change state:
/// `Uninitialized → Initialized → Connected`, and back down to
/// `Initialized` on disconnect or failed publish. `Uninitialized` is never
/// re-entered.
#[derive(Debug, Default)]
pub(crate) struct Session {
    state: LinkState,
    debug: bool,
}

impl Session {
    pub(crate) fn state(&self) -> LinkState {
        self.state
    }

    pub(crate) fn debug(&self) -> bool {
        self.debug
    }

    pub(crate) fn set_debug(&mut self, enable: bool) {
        self.debug = enable;
    }

    /// Liveness probe passed; `connected` reflects the module's own report
    pub(crate) fn mark_initialized(&mut self, connected: bool) {
        self.state = if connected {
            LinkState::Connected
        } else {
            LinkState::Initialized
        };
    }

    /// Session confirmed; only valid once initialized
    pub(crate) fn mark_connected(&mut self) {
        debug_assert!(self.state.is_initialized());
        self.state = LinkState::Connected;
    }

    /// Explicit disconnect or evidence the session dropped
    pub(crate) fn drop_connection(&mut self) {
        if self.state.is_connected() {
            self.state = LinkState::Initialized;
        }
    }
}
