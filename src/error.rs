//! Error types for connection bootstrap and transport I/O.
//!
//! Faults raised by user callbacks are not errors in this sense; they are
//! captured by the dispatcher and reported through
//! [`TerminationReason::Error`](crate::TerminationReason::Error).

use thiserror::Error;

/// Errors returned by [`start`](crate::start) before an actor exists.
///
/// Neither variant ever spawns an actor, so no terminate hook runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StartError {
    /// The URL is malformed or its scheme is not `ws`/`wss`.
    ///
    /// Returned synchronously, before the connector is consulted.
    #[error("invalid websocket url: {url}")]
    Url {
        /// The offending URL, verbatim.
        url: String,
    },

    /// The connector failed to open the socket or complete the handshake.
    #[error("connect failed: {0}")]
    Connect(#[from] ConnectError),
}

/// Errors surfaced by a [`Connector`](crate::Connector) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConnectError {
    /// The peer rejected or garbled the opening handshake.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The host could not be reached.
    #[error("host unreachable: {0}")]
    Unreachable(String),

    /// I/O error while opening the connection.
    #[error("i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ConnectError {
    fn from(err: std::io::Error) -> Self {
        ConnectError::Io(err.to_string())
    }
}

/// Errors surfaced by a [`Transport`](crate::Transport) when writing a frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportError {
    /// The connection is gone.
    #[error("connection closed")]
    Closed,

    /// I/O error on the underlying stream.
    #[error("i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err.to_string())
    }
}
