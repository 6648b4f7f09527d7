//! The transport seam: how frames reach the wire and how inbound events
//! reach the actor's mailbox.
//!
//! The actor never touches sockets. It owns a [`Transport`] exclusively for
//! writes, and a [`Connector`] hands it inbound traffic by pushing
//! [`TransportEvent`]s through the [`FrameSink`] it received at connect
//! time. TLS, the HTTP upgrade, and frame serialization all live behind
//! these two traits.

use tokio::sync::mpsc;
use url::Url;

use crate::error::{ConnectError, TransportError};
use crate::frame::Frame;

/// An inbound event produced by the transport's read side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A complete frame arrived from the peer.
    Frame(Frame),
    /// The connection dropped without a Close frame, with the cause when
    /// one is known.
    Disconnected(Option<TransportError>),
}

/// Sending half of the transport event channel.
///
/// Held by the transport's read task; delivery is fire-and-forget so a
/// transport never blocks on a slow actor. Dropping every clone without a
/// prior [`disconnected`](FrameSink::disconnected) reads as a clean end of
/// stream.
#[derive(Debug, Clone)]
pub struct FrameSink {
    tx: mpsc::UnboundedSender<TransportEvent>,
}

impl FrameSink {
    /// Deliver an inbound frame to the actor's mailbox.
    pub fn frame(&self, frame: Frame) {
        let _ = self.tx.send(TransportEvent::Frame(frame));
    }

    /// Signal that the connection dropped without a Close frame.
    pub fn disconnected(&self, cause: Option<TransportError>) {
        let _ = self.tx.send(TransportEvent::Disconnected(cause));
    }
}

/// Receiving half of the transport event channel, consumed by the actor.
#[derive(Debug)]
pub struct EventReceiver {
    pub(crate) rx: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Create a connected [`FrameSink`]/[`EventReceiver`] pair.
#[must_use]
pub fn event_channel() -> (FrameSink, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (FrameSink { tx }, EventReceiver { rx })
}

/// The write half of an open connection, exclusively owned by its actor.
pub trait Transport: Send + 'static {
    /// Write one frame to the peer.
    fn send(&mut self, frame: Frame) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Opens a socket for a validated URL and wires its read side to a
/// [`FrameSink`].
///
/// Implementations perform the handshake, spawn whatever read task they
/// need, and feed inbound frames and the final disconnect into `sink`.
pub trait Connector: Send {
    /// The transport produced on success.
    type Transport: Transport;

    /// Open the connection. `url` has already passed scheme validation.
    fn connect(
        &self,
        url: &Url,
        sink: FrameSink,
    ) -> impl Future<Output = Result<Self::Transport, ConnectError>> + Send;
}
