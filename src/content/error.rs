use thiserror::Error;

/// Errors describing malformed ids or pixel buffers.
#[derive(Debug, Error)]
pub enum ContentError {
    /// Content ids must be 1 to 64 bytes long.
    #[error("invalid content id length: {0}")]
    InvalidIdLength(usize),

    /// A hex-encoded id could not be parsed.
    #[error("invalid hex content id: {0}")]
    InvalidHex(String),

    /// Digest width outside the supported range.
    #[error("invalid hash width: {0}")]
    InvalidHashWidth(usize),

    /// The pixel buffer does not describe a consistent rectangle.
    #[error("invalid pixel buffer: {0}")]
    InvalidBuffer(String),
}
