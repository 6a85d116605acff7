use super::error::ContentError;
use super::id::ContentId;
use super::pixels::PixelBuffer;
use crate::constants::{DEFAULT_HASH_WIDTH, MAX_ID_LEN, MIN_ID_LEN, SHA256_MAX_WIDTH};
use sha2::{Digest, Sha256, Sha512};

#[derive(Clone)]
enum HashState {
    Narrow(Sha256),
    Wide(Sha512),
}

impl HashState {
    fn for_width(width: usize) -> Self {
        if width <= SHA256_MAX_WIDTH {
            HashState::Narrow(Sha256::new())
        } else {
            HashState::Wide(Sha512::new())
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            HashState::Narrow(h) => h.update(data),
            HashState::Wide(h) => h.update(data),
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self {
            HashState::Narrow(h) => h.finalize().to_vec(),
            HashState::Wide(h) => h.finalize().to_vec(),
        }
    }
}

/// Computes content ids of a fixed width.
///
/// Pure and stateless apart from the configured width, so a single hasher
/// can be shared freely between threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentHasher {
    width: usize,
}

impl ContentHasher {
    pub fn new(width: usize) -> Result<Self, ContentError> {
        if !(MIN_ID_LEN..=MAX_ID_LEN).contains(&width) {
            return Err(ContentError::InvalidHashWidth(width));
        }
        Ok(Self { width })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Hashes an arbitrary byte string.
    pub fn hash(&self, bytes: &[u8]) -> ContentId {
        let mut state = HashState::for_width(self.width);
        state.update(bytes);
        self.finish(state)
    }

    /// Hashes the visible pixels of a rectangle.
    ///
    /// Width, height and pixel size are folded into the digest, then each
    /// row contributes exactly `width * bpp` bytes; stride padding is skipped.
    pub fn hash_rect(&self, pixels: &PixelBuffer) -> ContentId {
        let mut state = HashState::for_width(self.width);
        state.update(&(pixels.width() as u32).to_be_bytes());
        state.update(&(pixels.height() as u32).to_be_bytes());
        state.update(&[pixels.format().bytes_per_pixel]);
        for row in pixels.rows() {
            state.update(row);
        }
        self.finish(state)
    }

    fn finish(&self, state: HashState) -> ContentId {
        let digest = state.finalize();
        ContentId::from_digest(&digest[..self.width])
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self {
            width: DEFAULT_HASH_WIDTH,
        }
    }
}
