//! Termination reporting: why a connection actor stopped.
//!
//! Every exit path computes exactly one [`TerminationReason`], hands it to
//! the handler's `terminate` hook, and then shapes it into the
//! [`ExitSignal`] the owning task observes through
//! [`ConnectionHandle::join`](crate::ConnectionHandle::join).

use thiserror::Error;

use crate::frame::CloseCode;
use crate::handler::Outcome;

/// Who initiated the close handshake, with the code and reason recorded at
/// initiation. Set once per actor and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The peer sent a Close frame first, or the transport dropped without
    /// one (recorded with code 1006).
    Remote {
        /// Close status code from the peer.
        code: CloseCode,
        /// Close reason from the peer.
        reason: String,
    },
    /// A local callback outcome initiated the close.
    Local {
        /// Close status code we sent.
        code: CloseCode,
        /// Close reason we sent.
        reason: String,
    },
}

impl DisconnectReason {
    /// The close status code, regardless of origin.
    #[must_use]
    pub fn code(&self) -> CloseCode {
        match self {
            DisconnectReason::Remote { code, .. } | DisconnectReason::Local { code, .. } => *code,
        }
    }

    /// The close reason, regardless of origin.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            DisconnectReason::Remote { reason, .. } | DisconnectReason::Local { reason, .. } => {
                reason
            }
        }
    }

    /// Returns `true` if the peer initiated the close.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, DisconnectReason::Remote { .. })
    }
}

/// The handler whose invocation produced a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Culprit {
    /// `handle_cast`
    HandleCast,
    /// `handle_info`
    HandleInfo,
    /// `handle_frame`
    HandleFrame,
    /// `handle_ping`
    HandlePing,
    /// `handle_pong`
    HandlePong,
    /// `handle_disconnect`
    HandleDisconnect,
}

impl std::fmt::Display for Culprit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Culprit::HandleCast => "handle_cast",
            Culprit::HandleInfo => "handle_info",
            Culprit::HandleFrame => "handle_frame",
            Culprit::HandlePing => "handle_ping",
            Culprit::HandlePong => "handle_pong",
            Culprit::HandleDisconnect => "handle_disconnect",
        };
        f.write_str(name)
    }
}

/// A captured handler failure: an outcome outside the callback contract, or
/// a panic raised during handler execution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Fault {
    /// A handler returned an outcome the dispatcher refuses to act on.
    #[error("{culprit} returned an invalid outcome ({detail}): {offending:?}")]
    BadResponse {
        /// The handler that returned the outcome.
        culprit: Culprit,
        /// The rejected outcome, verbatim.
        offending: Outcome,
        /// Why the outcome was rejected.
        detail: String,
    },

    /// A handler panicked while running.
    #[error("{culprit} panicked: {message}")]
    Panic {
        /// The handler that panicked.
        culprit: Culprit,
        /// The panic payload, rendered as a string where possible.
        message: String,
    },
}

impl Fault {
    /// The handler that produced this fault.
    #[must_use]
    pub const fn culprit(&self) -> Culprit {
        match self {
            Fault::BadResponse { culprit, .. } | Fault::Panic { culprit, .. } => *culprit,
        }
    }
}

/// The single computed cause of an actor's exit, handed to the `terminate`
/// hook exactly once per actor lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TerminationReason {
    /// Clean shutdown: all mailbox sources closed without a close handshake
    /// or fault.
    Normal,
    /// A local callback outcome closed the connection.
    LocalClose {
        /// Close status code sent to the peer.
        code: CloseCode,
        /// Close reason sent to the peer.
        reason: String,
    },
    /// The peer closed the connection (Close frame, or transport drop
    /// recorded as 1006).
    RemoteClose {
        /// Close status code received.
        code: CloseCode,
        /// Close reason received.
        reason: String,
    },
    /// A handler faulted or broke the callback contract.
    Error(Fault),
}

/// The structured exit payload an owning/linked task observes after the
/// actor stops. Mirrors [`TerminationReason`], with fault exits additionally
/// carrying the last user state.
#[derive(Debug)]
#[non_exhaustive]
pub enum ExitSignal<S> {
    /// Clean shutdown.
    Normal,
    /// We initiated the close.
    Local {
        /// Close status code sent.
        code: CloseCode,
        /// Close reason sent.
        reason: String,
    },
    /// The peer initiated the close.
    Remote {
        /// Close status code received.
        code: CloseCode,
        /// Close reason received.
        reason: String,
    },
    /// A handler faulted; carries the user state as of the fault.
    Fault {
        /// The captured fault.
        fault: Fault,
        /// The user state observed by the terminate hook.
        last_state: S,
    },
}

impl<S> ExitSignal<S> {
    /// Returns `true` for a clean (non-fault) exit.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        !matches!(self, ExitSignal::Fault { .. })
    }
}
