//! Connection lifecycle phases.

/// Phase of a connection actor's lifecycle.
///
/// Transitions are monotonic: `Open → ClosingLocal → Closed` when a local
/// callback outcome initiates the close, `Open → ClosingRemote → Closed`
/// when the peer does. A closed actor never reopens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum Phase {
    /// Connection is open; frames flow both ways.
    #[default]
    Open,
    /// A local close outcome is being carried out.
    ClosingLocal,
    /// A peer Close frame (or transport drop) is being carried out.
    ClosingRemote,
    /// The actor is terminating.
    Closed,
}

impl Phase {
    /// Returns `true` while no close handshake has started.
    #[must_use]
    #[inline]
    pub const fn is_open(&self) -> bool {
        matches!(self, Phase::Open)
    }

    /// Returns `true` once a close descriptor has been recorded.
    #[must_use]
    #[inline]
    pub const fn is_closing(&self) -> bool {
        matches!(self, Phase::ClosingLocal | Phase::ClosingRemote)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Open => write!(f, "Open"),
            Phase::ClosingLocal => write!(f, "ClosingLocal"),
            Phase::ClosingRemote => write!(f, "ClosingRemote"),
            Phase::Closed => write!(f, "Closed"),
        }
    }
}
