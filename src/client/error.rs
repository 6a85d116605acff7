use crate::codec::CodecError;
use crate::config::ConfigError;
use crate::content::{ContentError, ContentId, Rect};
use crate::protocol::ProtocolError;
use thiserror::Error;

/// Errors raised while applying server messages. All of them are fatal to
/// the connection.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("content error: {0}")]
    Content(#[from] ContentError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The server referenced content this client does not hold.
    #[error("reference to uncached content {0}")]
    ReferenceMiss(ContentId),

    /// Decoded or cached pixels do not cover the target rectangle.
    #[error("{width}x{height} pixels do not match rect {rect:?}")]
    GeometryMismatch { rect: Rect, width: u16, height: u16 },
}
