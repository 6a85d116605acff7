use super::error::CodecError;
use super::{PixelDecoder, PixelEncoder};
use crate::content::{PixelBuffer, PixelFormat, Rect};
use bytes::Bytes;

/// Uncompressed pixels, rows packed back to back.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCodec {
    format: PixelFormat,
}

impl RawCodec {
    pub fn new(format: PixelFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }
}

impl PixelEncoder for RawCodec {
    fn encode(&mut self, pixels: &PixelBuffer) -> Result<Bytes, CodecError> {
        if pixels.format() != self.format {
            return Err(CodecError::Encode(format!(
                "pixel format {:?} does not match codec format {:?}",
                pixels.format(),
                self.format
            )));
        }
        Ok(pixels.to_packed().data().clone())
    }

    fn is_lossy(&self) -> bool {
        false
    }
}

impl PixelDecoder for RawCodec {
    fn decode(&mut self, rect: &Rect, payload: &Bytes) -> Result<PixelBuffer, CodecError> {
        let expected = rect.area() as usize * self.format.bytes_per_pixel as usize;
        if payload.len() != expected {
            return Err(CodecError::SizeMismatch {
                expected,
                actual: payload.len(),
            });
        }
        Ok(PixelBuffer::packed(
            self.format,
            rect.width,
            rect.height,
            payload.clone(),
        )?)
    }

    fn is_lossy(&self) -> bool {
        false
    }
}
