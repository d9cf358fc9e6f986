//! Screen view-state machine (IDLE -> LOADING -> READY | ERROR).
//!
//! Each fetch is tagged with a generation; only the latest one may settle
//! the state. Used by every screen model in skycast-ui.

/// Lifecycle of one screen's data
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewState<T> {
    #[default]
    Idle,
    Loading,
    Ready(T),
    Error(String),
}

impl<T> ViewState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    /// True once a fetch has settled, either way.
    pub fn is_settled(&self) -> bool {
        matches!(self, ViewState::Ready(_) | ViewState::Error(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ViewState::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ViewState::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Monotonic request counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestGeneration {
    latest: u64,
}

impl RequestGeneration {
    /// Start a new request; any earlier generation becomes stale.
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn latest(self) -> u64 {
        self.latest
    }

    /// True if `generation` is the most recently issued one.
    pub fn is_current(self, generation: u64) -> bool {
        self.latest != 0 && generation == self.latest
    }
}
