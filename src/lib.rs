//! # wsactor - Actor-based WebSocket Client Behavior
//!
//! `wsactor` runs one actor per WebSocket connection. The actor owns the
//! connection's transport, drives the control-frame (ping/pong/close) state
//! machine, and dispatches every mailbox event to a user-supplied
//! [`Handler`] implementation.
//!
//! ## Guarantees
//!
//! - **Sequential dispatch**: one mailbox event is processed to completion
//!   before the next is considered; no locks, no interleaving.
//! - **Guaranteed cleanup**: the `terminate` hook runs exactly once on every
//!   exit path, including handler panics and contract violations.
//! - **Structured exits**: the owner observes a typed [`ExitSignal`]
//!   through [`ConnectionHandle::join`] instead of a crash.
//! - **Single close handshake**: at most one close descriptor per actor,
//!   and at most one Close frame sent.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wsactor::{Handler, Outcome, start};
//!
//! struct Echo;
//!
//! impl Handler for Echo {
//!     type State = u64;
//!     type Command = String;
//!     type Message = ();
//!
//!     fn handle_cast(&mut self, text: String, sent: &mut u64) -> Outcome {
//!         *sent += 1;
//!         Outcome::Reply(wsactor::Frame::text(text))
//!     }
//!
//!     fn handle_info(&mut self, _msg: (), _state: &mut u64) -> Outcome {
//!         Outcome::Continue
//!     }
//! }
//!
//! let handle = start(&connector, "ws://localhost:8080/socket", Echo, 0).await?;
//! handle.cast("hello".into());
//! let exit = handle.join().await?;
//! ```
//!
//! Framing, TLS, and the HTTP upgrade live behind the [`Connector`] and
//! [`Transport`] traits.

pub mod actor;
pub mod config;
pub mod connect;
pub mod error;
pub mod frame;
pub mod handler;
pub mod termination;
pub mod transport;

pub use actor::{ConnectionHandle, Phase};
pub use config::Config;
pub use connect::{start, start_with_config};
pub use error::{ConnectError, StartError, TransportError};
pub use frame::{CloseCode, CloseFrame, Frame, MAX_CONTROL_PAYLOAD};
pub use handler::{Handler, Outcome, defaults};
pub use termination::{
    Culprit, DisconnectReason, ExitSignal, Fault, TerminationReason,
};
pub use transport::{Connector, EventReceiver, FrameSink, Transport, TransportEvent, event_channel};

// `Connector::connect` takes a parsed URL; re-export the type so
// implementors do not need their own `url` dependency.
pub use url::Url;
