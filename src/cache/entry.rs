use crate::content::{ContentId, PixelBuffer, PixelFormat};

/// A decoded rectangle held by the client cache.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    id: ContentId,
    pixels: PixelBuffer,
}

impl CacheEntry {
    pub fn new(id: ContentId, pixels: PixelBuffer) -> Self {
        Self { id, pixels }
    }

    pub fn id(&self) -> &ContentId {
        &self.id
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn format(&self) -> PixelFormat {
        self.pixels.format()
    }

    pub fn width(&self) -> u16 {
        self.pixels.width()
    }

    pub fn height(&self) -> u16 {
        self.pixels.height()
    }

    /// Row pitch in pixels.
    pub fn stride(&self) -> usize {
        self.pixels.stride()
    }

    /// Bytes charged against the cache capacity.
    pub fn byte_size(&self) -> usize {
        self.pixels.byte_size()
    }
}
