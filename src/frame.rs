//! Wire-level frame model: the units the actor interprets or emits.

use bytes::Bytes;

/// Maximum payload size of a control frame (Ping/Pong/Close) per RFC 6455.
pub const MAX_CONTROL_PAYLOAD: usize = 125;

/// WebSocket close status code per RFC 6455 Section 7.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum CloseCode {
    /// Normal closure (1000).
    #[default]
    Normal,
    /// Going away (1001).
    GoingAway,
    /// Protocol error (1002).
    ProtocolError,
    /// Unsupported data (1003).
    UnsupportedData,
    /// Invalid payload (1007).
    InvalidPayload,
    /// Policy violation (1008).
    PolicyViolation,
    /// Message too big (1009).
    MessageTooBig,
    /// Internal error (1011).
    InternalError,
    /// Abnormal closure (1006). Never carried on the wire; records a
    /// transport-level disconnect that arrived without a Close frame.
    Abnormal,
    /// Any other code (registered 1012-1014, library/application 3000-4999).
    Other(u16),
}

impl CloseCode {
    /// Create a `CloseCode` from its numeric value.
    #[must_use]
    pub const fn from_u16(code: u16) -> Self {
        match code {
            1000 => CloseCode::Normal,
            1001 => CloseCode::GoingAway,
            1002 => CloseCode::ProtocolError,
            1003 => CloseCode::UnsupportedData,
            1006 => CloseCode::Abnormal,
            1007 => CloseCode::InvalidPayload,
            1008 => CloseCode::PolicyViolation,
            1009 => CloseCode::MessageTooBig,
            1011 => CloseCode::InternalError,
            other => CloseCode::Other(other),
        }
    }

    /// Get the numeric value of this close code.
    #[must_use]
    pub const fn as_u16(&self) -> u16 {
        match self {
            CloseCode::Normal => 1000,
            CloseCode::GoingAway => 1001,
            CloseCode::ProtocolError => 1002,
            CloseCode::UnsupportedData => 1003,
            CloseCode::Abnormal => 1006,
            CloseCode::InvalidPayload => 1007,
            CloseCode::PolicyViolation => 1008,
            CloseCode::MessageTooBig => 1009,
            CloseCode::InternalError => 1011,
            CloseCode::Other(code) => *code,
        }
    }

    /// Check if an endpoint may send this code in a Close frame per
    /// RFC 6455 Section 7.4.1.
    ///
    /// Sendable: 1000-1003, 1007-1014, 3000-4999. Codes 1004-1006 and 1015
    /// are reserved and MUST NOT be sent.
    #[must_use]
    pub const fn is_sendable(&self) -> bool {
        let code = self.as_u16();
        matches!(code, 1000..=1003 | 1007..=1014 | 3000..=4999)
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

/// Close descriptor carried by a Close frame: status code plus reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseFrame {
    /// The close status code.
    pub code: CloseCode,
    /// Human-readable reason for closing.
    pub reason: String,
}

impl CloseFrame {
    /// Create a new close descriptor with the given code and reason.
    #[must_use]
    pub fn new(code: CloseCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

/// A WebSocket frame as seen by the actor.
///
/// Immutable once constructed. Produced by user callbacks (outbound, via
/// [`Outcome::Reply`](crate::Outcome::Reply)) or by the transport (inbound).
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Frame {
    /// A text frame (UTF-8 encoded).
    Text(String),
    /// A binary frame.
    Binary(Bytes),
    /// A ping control frame with optional payload.
    Ping(Option<Bytes>),
    /// A pong control frame with optional payload.
    Pong(Option<Bytes>),
    /// A close control frame.
    Close(CloseFrame),
}

impl Frame {
    /// Create a text frame.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Frame::Text(s.into())
    }

    /// Create a binary frame.
    #[must_use]
    pub fn binary(data: impl Into<Bytes>) -> Self {
        Frame::Binary(data.into())
    }

    /// Create a ping frame carrying a payload.
    #[must_use]
    pub fn ping(data: impl Into<Bytes>) -> Self {
        Frame::Ping(Some(data.into()))
    }

    /// Create a pong frame carrying a payload.
    #[must_use]
    pub fn pong(data: impl Into<Bytes>) -> Self {
        Frame::Pong(Some(data.into()))
    }

    /// Create a close frame with status code and reason.
    #[must_use]
    pub fn close(code: CloseCode, reason: impl Into<String>) -> Self {
        Frame::Close(CloseFrame::new(code, reason))
    }

    /// Returns `true` if this is a control frame (ping, pong, or close).
    #[must_use]
    pub const fn is_control(&self) -> bool {
        matches!(self, Frame::Ping(_) | Frame::Pong(_) | Frame::Close(_))
    }

    /// Returns `true` if this is a data frame (text or binary).
    #[must_use]
    pub const fn is_data(&self) -> bool {
        matches!(self, Frame::Text(_) | Frame::Binary(_))
    }

    /// Payload length of a control frame, counting the close code's two
    /// bytes for Close frames. Returns `None` for data frames.
    #[must_use]
    pub fn control_payload_len(&self) -> Option<usize> {
        match self {
            Frame::Ping(payload) | Frame::Pong(payload) => {
                Some(payload.as_ref().map_or(0, Bytes::len))
            }
            Frame::Close(cf) => Some(2 + cf.reason.len()),
            _ => None,
        }
    }
}
