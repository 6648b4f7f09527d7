//! The connection actor: one per live connection.

mod actor;
mod phase;

pub use actor::ConnectionHandle;
pub use phase::Phase;
