use super::message::{Direction, MessageTag};
use thiserror::Error;

/// Errors on the cache protocol wire. All of them are fatal to the
/// connection.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Network I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the connection.
    #[error("connection closed")]
    ConnectionClosed,

    /// Operation timed out.
    #[error("timeout")]
    Timeout,

    /// Unknown message tag.
    #[error("unknown message tag: {0}")]
    UnknownTag(u8),

    /// Malformed message body.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Content id length outside 1..=64.
    #[error("invalid content id length: {0}")]
    InvalidIdLength(usize),

    /// Eviction batch larger than allowed.
    #[error("too many ids in eviction batch: {count} (max {max})")]
    TooManyIds { count: usize, max: usize },

    /// Frame body larger than the transport accepts.
    #[error("message too large: {0}")]
    MessageTooLarge(usize),

    /// A message arrived at the wrong end of the connection.
    #[error("unexpected {tag:?} message, expected {expected:?} traffic")]
    WrongDirection {
        tag: MessageTag,
        expected: Direction,
    },
}
