use crate::constants::DEFAULT_MIN_SEED_AREA;
use crate::content::{PixelBuffer, Rect};

/// Decides whether content the client has never asked for is worth
/// announcing with a seed and an init.
///
/// Only consulted for ids in the `Unknown` state.
pub trait SeedPolicy {
    fn should_seed(&self, rect: &Rect, pixels: &PixelBuffer) -> bool;
}

/// Never seeds; content is only cached after the client queries for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverSeed;

impl SeedPolicy for NeverSeed {
    fn should_seed(&self, _rect: &Rect, _pixels: &PixelBuffer) -> bool {
        false
    }
}

/// Seeds rectangles covering at least `min_area` pixels.
#[derive(Debug, Clone, Copy)]
pub struct MinAreaSeed {
    min_area: u32,
}

impl MinAreaSeed {
    pub fn new(min_area: u32) -> Self {
        Self { min_area }
    }

    pub fn min_area(&self) -> u32 {
        self.min_area
    }
}

impl Default for MinAreaSeed {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SEED_AREA)
    }
}

impl SeedPolicy for MinAreaSeed {
    fn should_seed(&self, rect: &Rect, _pixels: &PixelBuffer) -> bool {
        !rect.is_empty() && rect.area() >= self.min_area
    }
}

impl<T: SeedPolicy + ?Sized> SeedPolicy for Box<T> {
    fn should_seed(&self, rect: &Rect, pixels: &PixelBuffer) -> bool {
        (**self).should_seed(rect, pixels)
    }
}
