use super::error::ContentError;
use bytes::{Bytes, BytesMut};

/// A destination rectangle on the framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u32 {
        self.width as u32 * self.height as u32
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Layout of a single pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelFormat {
    pub bytes_per_pixel: u8,
    pub big_endian: bool,
}

impl PixelFormat {
    /// 32-bit true colour, little endian.
    pub const RGB888: PixelFormat = PixelFormat {
        bytes_per_pixel: 4,
        big_endian: false,
    };

    /// 16-bit true colour, little endian.
    pub const RGB565: PixelFormat = PixelFormat {
        bytes_per_pixel: 2,
        big_endian: false,
    };

    pub fn new(bytes_per_pixel: u8, big_endian: bool) -> Self {
        Self {
            bytes_per_pixel,
            big_endian,
        }
    }
}

impl Default for PixelFormat {
    fn default() -> Self {
        Self::RGB888
    }
}

/// Decoded pixels for one rectangle.
///
/// `stride` is measured in pixels, not bytes. Bytes between the end of a
/// row's visible pixels and the start of the next row are padding and never
/// contribute to the content id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    format: PixelFormat,
    width: u16,
    height: u16,
    stride: usize,
    data: Bytes,
}

impl PixelBuffer {
    pub fn new(
        format: PixelFormat,
        width: u16,
        height: u16,
        stride: usize,
        data: impl Into<Bytes>,
    ) -> Result<Self, ContentError> {
        let data = data.into();
        if format.bytes_per_pixel == 0 || format.bytes_per_pixel > 4 {
            return Err(ContentError::InvalidBuffer(format!(
                "unsupported bytes per pixel: {}",
                format.bytes_per_pixel
            )));
        }
        if stride < width as usize {
            return Err(ContentError::InvalidBuffer(format!(
                "stride {} shorter than width {}",
                stride, width
            )));
        }

        let bpp = format.bytes_per_pixel as usize;
        let required = stride.checked_mul(bpp).and_then(|stride_bytes| {
            if width == 0 || height == 0 {
                Some(0)
            } else {
                (height as usize - 1)
                    .checked_mul(stride_bytes)
                    .and_then(|n| n.checked_add(width as usize * bpp))
            }
        });
        let Some(required) = required else {
            return Err(ContentError::InvalidBuffer(format!(
                "stride {} overflows a {}x{} buffer",
                stride, width, height
            )));
        };
        if data.len() < required {
            return Err(ContentError::InvalidBuffer(format!(
                "{} bytes cannot hold {}x{} at stride {}",
                data.len(),
                width,
                height,
                stride
            )));
        }

        Ok(Self {
            format,
            width,
            height,
            stride,
            data,
        })
    }

    /// Creates a buffer whose rows are tightly packed (stride == width).
    pub fn packed(
        format: PixelFormat,
        width: u16,
        height: u16,
        data: impl Into<Bytes>,
    ) -> Result<Self, ContentError> {
        Self::new(format, width, height, width as usize, data)
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Row pitch in pixels.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Visible bytes in one row.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel as usize
    }

    pub fn stride_bytes(&self) -> usize {
        self.stride * self.format.bytes_per_pixel as usize
    }

    /// Bytes actually held by the buffer, padding included.
    pub fn byte_size(&self) -> usize {
        self.data.len()
    }

    /// Bytes of visible pixel data, padding excluded.
    pub fn visible_bytes(&self) -> usize {
        self.row_bytes() * self.height as usize
    }

    /// Iterates the visible portion of each row.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let row_bytes = self.row_bytes();
        let stride_bytes = self.stride_bytes();
        (0..self.height as usize).map(move |row| {
            let start = row * stride_bytes;
            &self.data[start..start + row_bytes]
        })
    }

    pub fn is_packed(&self) -> bool {
        self.stride == self.width as usize
    }

    /// Returns a tightly packed copy, or a cheap clone if already packed.
    pub fn to_packed(&self) -> PixelBuffer {
        if self.is_packed() {
            let mut out = self.clone();
            out.data = self.data.slice(..self.visible_bytes());
            return out;
        }
        let mut buf = BytesMut::with_capacity(self.visible_bytes());
        for row in self.rows() {
            buf.extend_from_slice(row);
        }
        PixelBuffer {
            format: self.format,
            width: self.width,
            height: self.height,
            stride: self.width as usize,
            data: buf.freeze(),
        }
    }

    /// True if the buffer has the same dimensions as `rect`.
    pub fn fits(&self, rect: &Rect) -> bool {
        self.width == rect.width && self.height == rect.height
    }
}
