//! The callback contract: the capability set a user type implements.
//!
//! The dispatcher routes every mailbox event to one of the `handle_*`
//! callbacks and acts on the returned [`Outcome`]. `handle_cast` and
//! `handle_info` are mandatory; every other hook has a built-in default.
//! An override that wants the default behavior as well runs it explicitly
//! through the [`defaults`] module, as an ordinary call:
//!
//! ```rust,ignore
//! fn handle_ping(&mut self, payload: Option<Bytes>, state: &mut State) -> Outcome {
//!     state.pings_seen += 1;
//!     defaults::handle_ping(payload)
//! }
//! ```

use bytes::Bytes;

use crate::frame::{CloseCode, Frame};
use crate::termination::{DisconnectReason, TerminationReason};

/// The action a callback instructs the dispatcher to take next.
///
/// Returned by every `handle_*` callback. The user state is mutated in
/// place through the `&mut State` argument; the outcome only tags what the
/// dispatcher does after the callback returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Keep running with the (possibly mutated) state.
    Continue,
    /// Send the carried frame over the transport, then keep running.
    Reply(Frame),
    /// Initiate a local close with the configured default code and reason.
    Close,
    /// Initiate a local close with an explicit code and reason.
    CloseWith(CloseCode, String),
}

/// Callback logic bound to one connection actor.
///
/// Implementations are owned by their actor and invoked sequentially, one
/// mailbox event at a time. Callbacks must not block; long-running work
/// belongs on a separate task that feeds results back via
/// [`ConnectionHandle::notify`](crate::ConnectionHandle::notify).
pub trait Handler: Send + 'static {
    /// User-owned state threaded through every callback. The actor never
    /// inspects it.
    type State: Send + 'static;
    /// Command type delivered by [`ConnectionHandle::cast`](crate::ConnectionHandle::cast).
    type Command: Send + 'static;
    /// Arbitrary message type delivered by
    /// [`ConnectionHandle::notify`](crate::ConnectionHandle::notify).
    type Message: Send + 'static;

    /// Invoked for every user command sent through `cast`.
    fn handle_cast(&mut self, command: Self::Command, state: &mut Self::State) -> Outcome;

    /// Invoked for every arbitrary message sent through `notify`.
    fn handle_info(&mut self, message: Self::Message, state: &mut Self::State) -> Outcome;

    /// Invoked for every inbound data frame (Text or Binary).
    ///
    /// Default: ignore the frame and continue.
    fn handle_frame(&mut self, frame: Frame, state: &mut Self::State) -> Outcome {
        let _ = state;
        defaults::handle_frame(frame)
    }

    /// Invoked for every inbound Ping frame.
    ///
    /// Default: reply with a Pong carrying the same payload.
    fn handle_ping(&mut self, payload: Option<Bytes>, state: &mut Self::State) -> Outcome {
        let _ = state;
        defaults::handle_ping(payload)
    }

    /// Invoked for every inbound Pong frame.
    ///
    /// Default: continue.
    fn handle_pong(&mut self, payload: Option<Bytes>, state: &mut Self::State) -> Outcome {
        let _ = state;
        defaults::handle_pong(payload)
    }

    /// Invoked exactly once when the connection is closing: on a peer Close
    /// frame, or on a transport-level disconnect (code 1006).
    ///
    /// Default: close with the received code and reason.
    fn handle_disconnect(
        &mut self,
        reason: &DisconnectReason,
        state: &mut Self::State,
    ) -> Outcome {
        let _ = state;
        defaults::handle_disconnect(reason)
    }

    /// Invoked exactly once per actor lifetime, on every exit path, with
    /// the final user state and the computed termination reason.
    ///
    /// Default: no-op. A panic here is logged and never suppresses the
    /// original exit reason.
    fn terminate(&mut self, reason: &TerminationReason, state: &Self::State) {
        let _ = (reason, state);
    }
}

/// Default callback behaviors, callable from overrides as plain functions.
pub mod defaults {
    use super::*;

    /// Ignore an inbound data frame.
    #[must_use]
    pub fn handle_frame(_frame: Frame) -> Outcome {
        Outcome::Continue
    }

    /// Echo an inbound Ping's payload back as a Pong.
    #[must_use]
    pub fn handle_ping(payload: Option<Bytes>) -> Outcome {
        Outcome::Reply(Frame::Pong(payload))
    }

    /// Ignore an inbound Pong.
    #[must_use]
    pub fn handle_pong(_payload: Option<Bytes>) -> Outcome {
        Outcome::Continue
    }

    /// Close with the code and reason of the disconnect being handled.
    #[must_use]
    pub fn handle_disconnect(reason: &DisconnectReason) -> Outcome {
        Outcome::CloseWith(reason.code(), reason.reason().to_owned())
    }
}
