//! Configuration for connection actors.

use crate::frame::{CloseCode, CloseFrame, MAX_CONTROL_PAYLOAD};

// A close payload carries two status-code bytes before the reason.
const MAX_CLOSE_REASON: usize = MAX_CONTROL_PAYLOAD - 2;

/// Configuration applied to a connection actor at spawn time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    default_close: CloseFrame,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_close: CloseFrame::new(CloseCode::Normal, ""),
        }
    }
}

impl Config {
    /// Create a config with an explicit default close code and reason, used
    /// when a callback returns the plain
    /// [`Outcome::Close`](crate::Outcome::Close).
    ///
    /// The default is code 1000 (normal closure) with an empty reason. The
    /// stored frame is always sendable: a code RFC 6455 forbids an endpoint
    /// to send falls back to 1000, and a reason longer than 123 bytes is
    /// truncated on a character boundary.
    #[must_use]
    pub fn with_default_close(code: CloseCode, reason: impl Into<String>) -> Self {
        let code = if code.is_sendable() {
            code
        } else {
            CloseCode::Normal
        };
        let mut reason = reason.into();
        if reason.len() > MAX_CLOSE_REASON {
            let mut end = MAX_CLOSE_REASON;
            while !reason.is_char_boundary(end) {
                end -= 1;
            }
            reason.truncate(end);
        }
        Self {
            default_close: CloseFrame::new(code, reason),
        }
    }

    /// The close frame sent for a plain `Close` outcome.
    #[must_use]
    pub fn default_close(&self) -> &CloseFrame {
        &self.default_close
    }
}
