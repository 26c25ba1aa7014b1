//! RGB → luma reduction.
//!
//! `gray = trunc(0.30 * r + 0.59 * g + 0.11 * b)`, evaluated in `f64` in that
//! operand order and truncated toward zero, so results match the reference
//! bit for bit (pure red 255 gives 76, not 77).
//!
//! Every output sample depends only on its own input pixel, so the rows are
//! converted in parallel on the partitioner's pool with no coordination.

use crate::partition::{PartitionStrategy, WorkPartitioner};
use crate::types::{GrayscaleImage, RGB_CHANNELS, RasterImage};
use rayon::prelude::*;

pub const RED_WEIGHT: f64 = 0.30;
pub const GREEN_WEIGHT: f64 = 0.59;
pub const BLUE_WEIGHT: f64 = 0.11;

/// Luma of one pixel, truncated.
#[inline]
pub fn luma(red: u8, green: u8, blue: u8) -> u8 {
    (RED_WEIGHT * f64::from(red) + GREEN_WEIGHT * f64::from(green) + BLUE_WEIGHT * f64::from(blue))
        as u8
}

fn reduce_row(src: &[u8], dst: &mut [u8]) {
    for (px, out) in src.chunks_exact(RGB_CHANNELS).zip(dst.iter_mut()) {
        *out = luma(px[0], px[1], px[2]);
    }
}

/// Reduce `raster` to a grayscale image of the same size.
pub fn reduce(raster: &RasterImage, partitioner: &WorkPartitioner) -> GrayscaleImage {
    let size = raster.size();
    let stride = raster.row_stride();
    let mut data = vec![0u8; size.pixel_count()];

    if partitioner.strategy() == PartitionStrategy::Serial {
        raster
            .as_raw()
            .chunks_exact(stride)
            .zip(data.chunks_exact_mut(size.width()))
            .for_each(|(src, dst)| reduce_row(src, dst));
    } else {
        partitioner.install(|| {
            raster
                .as_raw()
                .par_chunks_exact(stride)
                .zip(data.par_chunks_exact_mut(size.width()))
                .for_each(|(src, dst)| reduce_row(src, dst));
        });
    }

    GrayscaleImage::from_raw(size, data).expect("luma buffer has exactly one sample per pixel")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{gradient_raster, size};

    #[test]
    fn luma_equal_channels_is_identity() {
        assert_eq!(luma(100, 100, 100), 100);
        assert_eq!(luma(0, 0, 0), 0);
    }

    #[test]
    fn luma_truncates_instead_of_rounding() {
        // 0.30 * 255 = 76.5
        assert_eq!(luma(255, 0, 0), 76);
        // 0.59 * 255 = 150.45
        assert_eq!(luma(0, 255, 0), 150);
        // 0.11 * 255 = 28.05
        assert_eq!(luma(0, 0, 255), 28);
    }

    #[test]
    fn reduce_keeps_dimensions() {
        let raster = gradient_raster(size(17, 9));
        let gray = reduce(&raster, &WorkPartitioner::serial());
        assert_eq!(gray.size(), raster.size());
    }

    #[test]
    fn reduce_applies_luma_per_pixel() {
        let raster = gradient_raster(size(6, 5));
        let gray = reduce(&raster, &WorkPartitioner::serial());
        for y in 0..5 {
            for x in 0..6 {
                let [r, g, b] = raster.pixel(x, y);
                assert_eq!(gray.get(x, y), luma(r, g, b), "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn reduce_is_independent_of_thread_count() {
        let raster = gradient_raster(size(64, 41));
        let expected = reduce(&raster, &WorkPartitioner::serial());
        for threads in [1, 2, 3, 7] {
            let partitioner = WorkPartitioner::new(PartitionStrategy::RowChunked, threads).unwrap();
            assert_eq!(reduce(&raster, &partitioner), expected, "threads = {threads}");
        }
    }
}
