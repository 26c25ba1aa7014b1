#![allow(dead_code)]

use sobel_edges::types::{ImageSize, RasterImage};
use std::path::Path;

pub fn size(width: usize, height: usize) -> ImageSize {
    ImageSize::new(width, height).expect("test sizes are larger than 2x2")
}

/// High-contrast RGB checkerboard; every cell border is an edge.
pub fn checkerboard_rgb(size: ImageSize, cell: usize) -> RasterImage {
    assert!(cell > 0, "cell size must be positive");
    RasterImage::from_fn(size, |x, y| {
        if ((x / cell) + (y / cell)) % 2 == 0 {
            [32, 40, 28]
        } else {
            [220, 210, 230]
        }
    })
}

/// Smooth diagonal color ramp with per-pixel variation in every channel.
pub fn ramp_rgb(size: ImageSize) -> RasterImage {
    RasterImage::from_fn(size, |x, y| {
        [
            ((x * 7 + y) % 256) as u8,
            ((y * 5 + x * 3) % 256) as u8,
            ((x * y) % 256) as u8,
        ]
    })
}

/// Write `raster` as an RGB PNG through the `image` crate.
pub fn write_rgb_png(path: &Path, raster: &RasterImage) {
    let img = image::RgbImage::from_raw(
        raster.width() as u32,
        raster.height() as u32,
        raster.as_raw().to_vec(),
    )
    .expect("raster buffer matches its dimensions");
    img.save(path).expect("write test png");
}

/// Read an image file back as single-channel samples.
pub fn read_luma(path: &Path) -> image::GrayImage {
    image::open(path).expect("open written image").into_luma8()
}
