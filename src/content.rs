//! Content identity for framebuffer rectangles.
//!
//! This module defines what a piece of cacheable content *is*: a rectangle
//! of pixels in a known format, and the digest that names it.
//!
//! - [`ContentId`] - 1 to 64 byte content digest
//! - [`Rect`] - destination rectangle on the framebuffer
//! - [`PixelFormat`] / [`PixelBuffer`] - decoded pixels with stride
//! - [`ContentHasher`] - digest over the visible bytes of a buffer
//!
//! # Canonical and observed ids
//!
//! The server hashes the pixels it is about to encode (the *canonical* id).
//! The client hashes whatever its decoder produced (the *observed* id). For
//! lossless codecs the two agree; lossy codecs make them diverge, which the
//! synchronization protocol reconciles with hash reports.
//!
//! # Examples
//!
//! ```
//! use rectcache::content::{ContentHasher, PixelBuffer, PixelFormat};
//!
//! let hasher = ContentHasher::new(16).unwrap();
//! let a = PixelBuffer::packed(PixelFormat::RGB888, 2, 2, vec![7u8; 16]).unwrap();
//!
//! // Same visible pixels behind a padded stride hash identically.
//! let mut padded = vec![0xEEu8; 3 * 4 * 2];
//! padded[..8].fill(7);
//! padded[12..20].fill(7);
//! let b = PixelBuffer::new(PixelFormat::RGB888, 2, 2, 3, padded).unwrap();
//!
//! assert_eq!(hasher.hash_rect(&a), hasher.hash_rect(&b));
//! ```

mod error;
mod hasher;
mod id;
mod pixels;

pub use error::ContentError;
pub use hasher::ContentHasher;
pub use id::ContentId;
pub use pixels::{PixelBuffer, PixelFormat, Rect};

#[cfg(test)]
mod tests;
