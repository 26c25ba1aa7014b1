//! Shared test utilities: synthetic images and edge-map assertions.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let gray = step_edge_gray(size(5, 5), 2, 0, 255);
//! let gradient = SobelOperator::default().compute_gradient(&gray, &WorkPartitioner::serial());
//! assert_border_zero(&gradient);
//! ```

use crate::types::{GradientImage, GrayscaleImage, ImageSize, RasterImage};

// =========================================================================
// Builders
// =========================================================================

/// Shorthand for a valid [`ImageSize`]; panics on invalid dimensions.
pub fn size(width: usize, height: usize) -> ImageSize {
    ImageSize::new(width, height).unwrap()
}

/// Deterministic xorshift stream, so "noise" is identical on every run.
pub struct XorShift(u64);

impl XorShift {
    pub fn new(seed: u64) -> Self {
        Self(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1)
    }

    pub fn next_u8(&mut self) -> u8 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        (self.0 >> 56) as u8
    }
}

/// Grayscale image of pseudo-random samples.
pub fn noise_gray(size: ImageSize, seed: u64) -> GrayscaleImage {
    let mut rng = XorShift::new(seed);
    GrayscaleImage::from_fn(size, |_, _| rng.next_u8())
}

/// RGB image of pseudo-random samples.
pub fn noise_raster(size: ImageSize, seed: u64) -> RasterImage {
    let mut rng = XorShift::new(seed);
    RasterImage::from_fn(size, |_, _| [rng.next_u8(), rng.next_u8(), rng.next_u8()])
}

/// RGB image whose channels vary smoothly with position.
pub fn gradient_raster(size: ImageSize) -> RasterImage {
    RasterImage::from_fn(size, |x, y| {
        [
            (x * 255 / size.width()) as u8,
            (y * 255 / size.height()) as u8,
            ((x + y) % 256) as u8,
        ]
    })
}

/// Columns `< edge_col` are `low`, the rest are `high`.
pub fn step_edge_gray(size: ImageSize, edge_col: usize, low: u8, high: u8) -> GrayscaleImage {
    GrayscaleImage::from_fn(size, |x, _| if x < edge_col { low } else { high })
}

// =========================================================================
// Assertions
// =========================================================================

/// Assert the outer ring of `gradient` is entirely zero.
pub fn assert_border_zero(gradient: &GradientImage) {
    let (w, h) = (gradient.width(), gradient.height());
    for x in 0..w {
        assert_eq!(gradient.get(x, 0), 0, "top border at x={x}");
        assert_eq!(gradient.get(x, h - 1), 0, "bottom border at x={x}");
    }
    for y in 0..h {
        assert_eq!(gradient.get(0, y), 0, "left border at y={y}");
        assert_eq!(gradient.get(w - 1, y), 0, "right border at y={y}");
    }
}

#[test]
fn xorshift_is_deterministic() {
    let a: Vec<u8> = {
        let mut rng = XorShift::new(42);
        (0..16).map(|_| rng.next_u8()).collect()
    };
    let b: Vec<u8> = {
        let mut rng = XorShift::new(42);
        (0..16).map(|_| rng.next_u8()).collect()
    };
    assert_eq!(a, b);
    assert!(a.iter().any(|&v| v != a[0]));
}
