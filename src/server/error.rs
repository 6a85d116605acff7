use crate::codec::CodecError;
use crate::config::ConfigError;
use crate::content::{ContentError, Rect};
use crate::protocol::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("content error: {0}")]
    Content(#[from] ContentError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The pixel buffer does not cover the rectangle it is encoded for.
    #[error("{width}x{height} pixels do not match rect {rect:?}")]
    GeometryMismatch { rect: Rect, width: u16, height: u16 },
}
