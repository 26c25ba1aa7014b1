//! 3x3 Sobel gradient magnitude.
//!
//! For each interior pixel the horizontal and vertical Sobel responses are
//! combined with the L1 norm and clipped:
//!
//! ```text
//! Gx = [-1 0 1]      Gy = [-1 -2 -1]
//!      [-2 0 2]           [ 0  0  0]
//!      [-1 0 1]           [ 1  2  1]
//!
//! magnitude = |gx| + |gy|                        // 0..=2040
//! output    = magnitude > threshold ? 255 : magnitude
//! ```
//!
//! With the default threshold of 255 this is plain saturation. Lower
//! thresholds push weak-but-present edges straight to white.
//!
//! The value at `(x, y)` depends only on the read-only 3x3 window of the
//! grayscale image around it, so every [`PartitionStrategy`] produces the same
//! bytes. The strategies differ only in how output writes are kept disjoint:
//!
//! | Strategy | Write isolation |
//! |---|---|
//! | `RowChunked` | each worker gets a `&mut` band of whole rows |
//! | `IndexChunked` | each worker gets the `&mut` linear span its flat indices map to |
//! | `PrivateBufferMerge` | each worker fills a private buffer, then copies its rows under a mutex |
//! | `Serial` | one worker, no sharing |
//!
//! Border pixels are never computed and keep the output's initial value, 0.

use crate::partition::{PartitionStrategy, WorkPartitioner, split_spans_mut};
use crate::types::{GradientImage, GrayscaleImage, ImageSize};
use rayon::prelude::*;
use std::ops::Range;
use std::sync::{Mutex, PoisonError};

pub type Kernel3 = [[i32; 3]; 3];

pub const SOBEL_X: Kernel3 = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];
pub const SOBEL_Y: Kernel3 = [[-1, -2, -1], [0, 0, 0], [1, 2, 1]];

/// Output value for magnitudes above the clip threshold.
pub const SATURATED: u8 = 255;

/// Sobel edge detector with a configurable clip threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SobelOperator {
    clip_threshold: u8,
}

impl Default for SobelOperator {
    fn default() -> Self {
        Self::new(SATURATED)
    }
}

/// Raw (unclipped) L1 gradient magnitude at interior pixel `(x, y)`.
#[inline]
pub fn magnitude_at(gray: &GrayscaleImage, x: usize, y: usize) -> u32 {
    let mut gx = 0i32;
    let mut gy = 0i32;
    for (ky, row_y) in (y - 1..=y + 1).enumerate() {
        let row = &gray.row(row_y)[x - 1..=x + 1];
        for (kx, &sample) in row.iter().enumerate() {
            let v = i32::from(sample);
            gx += SOBEL_X[ky][kx] * v;
            gy += SOBEL_Y[ky][kx] * v;
        }
    }
    gx.unsigned_abs() + gy.unsigned_abs()
}

/// Linear offset in the full image of flat interior index `i`.
#[inline]
fn interior_offset(size: ImageSize, i: usize) -> usize {
    let interior_width = size.width() - 2;
    let y = 1 + i / interior_width;
    let x = 1 + i % interior_width;
    y * size.width() + x
}

impl SobelOperator {
    pub fn new(clip_threshold: u8) -> Self {
        Self { clip_threshold }
    }

    pub fn clip_threshold(&self) -> u8 {
        self.clip_threshold
    }

    #[inline]
    pub fn clip(&self, magnitude: u32) -> u8 {
        if magnitude > u32::from(self.clip_threshold) {
            SATURATED
        } else {
            magnitude as u8
        }
    }

    /// Compute the edge map of `gray` using `partitioner`'s strategy and pool.
    pub fn compute_gradient(
        &self,
        gray: &GrayscaleImage,
        partitioner: &WorkPartitioner,
    ) -> GradientImage {
        let mut out = GradientImage::new(gray.size());
        match partitioner.strategy() {
            PartitionStrategy::Serial => {
                let rows = gray.size().interior_rows();
                self.fill_rows(gray, rows.clone(), out.rows_mut(rows));
            }
            PartitionStrategy::RowChunked => self.row_chunked(gray, partitioner, &mut out),
            PartitionStrategy::IndexChunked => self.index_chunked(gray, partitioner, &mut out),
            PartitionStrategy::PrivateBufferMerge => {
                out = self.private_buffer_merge(gray, partitioner);
            }
        }
        out
    }

    /// Write rows `rows` into `band`, which holds exactly those rows.
    fn fill_rows(&self, gray: &GrayscaleImage, rows: Range<usize>, band: &mut [u8]) {
        let width = gray.width();
        for (y, out_row) in rows.zip(band.chunks_exact_mut(width)) {
            for x in 1..width - 1 {
                out_row[x] = self.clip(magnitude_at(gray, x, y));
            }
        }
    }

    fn row_chunked(
        &self,
        gray: &GrayscaleImage,
        partitioner: &WorkPartitioner,
        out: &mut GradientImage,
    ) {
        let width = gray.width();
        let ranges = partitioner.row_ranges(gray.size());
        log::debug!("row-chunked: {} bands over {} rows", ranges.len(), gray.height());

        let spans: Vec<Range<usize>> = ranges
            .iter()
            .map(|r| r.start * width..r.end * width)
            .collect();
        let bands = split_spans_mut(out.as_mut_slice(), &spans);

        partitioner.install(|| {
            ranges
                .into_par_iter()
                .zip(bands)
                .for_each(|(rows, band)| self.fill_rows(gray, rows, band));
        });
    }

    fn index_chunked(
        &self,
        gray: &GrayscaleImage,
        partitioner: &WorkPartitioner,
        out: &mut GradientImage,
    ) {
        let size = gray.size();
        let ranges = partitioner.index_ranges(size);
        log::debug!(
            "index-chunked: {} ranges over {} interior pixels",
            ranges.len(),
            size.interior_pixel_count()
        );

        // Flat indices map monotonically to linear offsets, so each range
        // owns one contiguous span of the output (border pixels inside a span
        // are never written).
        let spans: Vec<Range<usize>> = ranges
            .iter()
            .map(|r| interior_offset(size, r.start)..interior_offset(size, r.end - 1) + 1)
            .collect();
        let pieces = split_spans_mut(out.as_mut_slice(), &spans);

        partitioner.install(|| {
            ranges
                .into_par_iter()
                .zip(pieces)
                .for_each(|(indices, piece)| {
                    let base = interior_offset(size, indices.start);
                    let interior_width = size.width() - 2;
                    for i in indices {
                        let x = 1 + i % interior_width;
                        let y = 1 + i / interior_width;
                        piece[interior_offset(size, i) - base] =
                            self.clip(magnitude_at(gray, x, y));
                    }
                });
        });
    }

    fn private_buffer_merge(
        &self,
        gray: &GrayscaleImage,
        partitioner: &WorkPartitioner,
    ) -> GradientImage {
        let size = gray.size();
        let ranges = partitioner.row_ranges(size);
        log::debug!("private-buffer-merge: {} private buffers", ranges.len());

        let shared = Mutex::new(GradientImage::new(size));
        partitioner.install(|| {
            ranges.into_par_iter().for_each(|rows| {
                let mut private = GradientImage::new(size);
                self.fill_rows(gray, rows.clone(), private.rows_mut(rows.clone()));

                let mut out = shared.lock().unwrap_or_else(PoisonError::into_inner);
                out.copy_rows_from(&private, rows);
            });
        });
        shared.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}
