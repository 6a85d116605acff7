//! Seams to the pixel codec and the renderer.
//!
//! Compression is not part of this crate. The server drives a
//! [`PixelEncoder`], the client a [`PixelDecoder`], and decoded or cached
//! pixels leave the client through a [`FramebufferSink`]. [`RawCodec`] is
//! an uncompressed, lossless implementation of both codec halves.

mod error;
mod raw;

pub use error::CodecError;
pub use raw::RawCodec;

use crate::content::{PixelBuffer, Rect};
use bytes::Bytes;

/// Server half of the external codec.
pub trait PixelEncoder {
    fn encode(&mut self, pixels: &PixelBuffer) -> Result<Bytes, CodecError>;

    /// Whether decoding the output may not reproduce the input exactly.
    fn is_lossy(&self) -> bool;
}

/// Client half of the external codec.
pub trait PixelDecoder {
    fn decode(&mut self, rect: &Rect, payload: &Bytes) -> Result<PixelBuffer, CodecError>;

    /// Whether decoded pixels may differ from what the server hashed.
    ///
    /// A hash mismatch from a lossless decoder is reported as a
    /// correctness warning instead of being learned as an alias.
    fn is_lossy(&self) -> bool;
}

/// Receives pixels ready to be drawn.
///
/// Both calls deliver the same kind of buffer; the renderer does not need
/// to care whether pixels came off the wire or out of the cache.
pub trait FramebufferSink {
    fn decoded_pixels_ready(&mut self, rect: &Rect, pixels: &PixelBuffer);

    fn cached_pixels_ready(&mut self, rect: &Rect, pixels: &PixelBuffer);
}

impl<T: PixelEncoder + ?Sized> PixelEncoder for Box<T> {
    fn encode(&mut self, pixels: &PixelBuffer) -> Result<Bytes, CodecError> {
        (**self).encode(pixels)
    }

    fn is_lossy(&self) -> bool {
        (**self).is_lossy()
    }
}

impl<T: PixelDecoder + ?Sized> PixelDecoder for Box<T> {
    fn decode(&mut self, rect: &Rect, payload: &Bytes) -> Result<PixelBuffer, CodecError> {
        (**self).decode(rect, payload)
    }

    fn is_lossy(&self) -> bool {
        (**self).is_lossy()
    }
}
