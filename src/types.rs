//! Owned raster buffers passed between pipeline stages.
//!
//! Every buffer is sized by an [`ImageSize`], and `ImageSize` can only be
//! obtained through [`ImageSize::new`], which rejects images too small for a
//! 3x3 kernel. A buffer therefore never exists for an invalid size.
//!
//! | Type | Channels | Produced by | Consumed by |
//! |---|---|---|---|
//! | [`RasterImage`] | 3 (RGB) | image backend (decode) | [`grayscale::reduce`](crate::grayscale::reduce) |
//! | [`GrayscaleImage`] | 1 | [`grayscale::reduce`](crate::grayscale::reduce) | [`SobelOperator`](crate::sobel::SobelOperator) |
//! | [`GradientImage`] | 1 | [`SobelOperator`](crate::sobel::SobelOperator) | image backend (encode) |
//!
//! All three store samples row-major in a single `Vec<u8>`.

use crate::config::ConfigError;
use serde::Serialize;
use std::ops::Range;

/// Samples per pixel in a [`RasterImage`].
pub const RGB_CHANNELS: usize = 3;

/// Validated image dimensions (both strictly greater than 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageSize {
    width: usize,
    height: usize,
}

impl ImageSize {
    pub fn new(width: usize, height: usize) -> Result<Self, ConfigError> {
        if width <= 2 || height <= 2 {
            return Err(ConfigError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(self) -> usize {
        self.width
    }

    pub fn height(self) -> usize {
        self.height
    }

    pub fn pixel_count(self) -> usize {
        self.width * self.height
    }

    /// Rows with a full 3x3 neighborhood: `1..height - 1`.
    pub fn interior_rows(self) -> Range<usize> {
        1..self.height - 1
    }

    /// Columns with a full 3x3 neighborhood: `1..width - 1`.
    pub fn interior_cols(self) -> Range<usize> {
        1..self.width - 1
    }

    /// Number of pixels that receive a gradient value.
    pub fn interior_pixel_count(self) -> usize {
        (self.width - 2) * (self.height - 2)
    }
}

/// Decoded 8-bit RGB image, interleaved `[r, g, b, r, g, b, ...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    size: ImageSize,
    data: Vec<u8>,
}

impl RasterImage {
    /// Wrap an interleaved RGB buffer. Returns `None` if `data` is not
    /// exactly `width * height * 3` bytes.
    pub fn from_raw(size: ImageSize, data: Vec<u8>) -> Option<Self> {
        (data.len() == size.pixel_count() * RGB_CHANNELS).then_some(Self { size, data })
    }

    pub fn from_fn(size: ImageSize, mut f: impl FnMut(usize, usize) -> [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(size.pixel_count() * RGB_CHANNELS);
        for y in 0..size.height {
            for x in 0..size.width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self { size, data }
    }

    pub fn size(&self) -> ImageSize {
        self.size
    }

    pub fn width(&self) -> usize {
        self.size.width
    }

    pub fn height(&self) -> usize {
        self.size.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.size.width + x) * RGB_CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Bytes of one row (`width * 3` samples).
    pub fn row_stride(&self) -> usize {
        self.size.width * RGB_CHANNELS
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }
}

/// Single-channel luma image produced by the grayscale reduction.
///
/// Read-only once built: the gradient stage shares it across workers by
/// reference, including the halo rows around each worker's range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayscaleImage {
    size: ImageSize,
    data: Vec<u8>,
}

impl GrayscaleImage {
    pub fn from_raw(size: ImageSize, data: Vec<u8>) -> Option<Self> {
        (data.len() == size.pixel_count()).then_some(Self { size, data })
    }

    pub fn from_fn(size: ImageSize, mut f: impl FnMut(usize, usize) -> u8) -> Self {
        let mut data = Vec::with_capacity(size.pixel_count());
        for y in 0..size.height {
            for x in 0..size.width {
                data.push(f(x, y));
            }
        }
        Self { size, data }
    }

    /// Every sample set to `value`.
    pub fn filled(size: ImageSize, value: u8) -> Self {
        Self {
            size,
            data: vec![value; size.pixel_count()],
        }
    }

    pub fn size(&self) -> ImageSize {
        self.size
    }

    pub fn width(&self) -> usize {
        self.size.width
    }

    pub fn height(&self) -> usize {
        self.size.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.size.width + x]
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.size.width;
        &self.data[start..start + self.size.width]
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }
}

/// Single-channel edge map.
///
/// Starts zero-filled; the border row/column is never written, so it stays 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradientImage {
    size: ImageSize,
    data: Vec<u8>,
}

impl GradientImage {
    pub fn new(size: ImageSize) -> Self {
        Self {
            size,
            data: vec![0; size.pixel_count()],
        }
    }

    pub fn size(&self) -> ImageSize {
        self.size
    }

    pub fn width(&self) -> usize {
        self.size.width
    }

    pub fn height(&self) -> usize {
        self.size.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.size.width + x]
    }

    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.size.width;
        &self.data[start..start + self.size.width]
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Mutable view over whole rows `rows.start..rows.end`.
    pub(crate) fn rows_mut(&mut self, rows: Range<usize>) -> &mut [u8] {
        let w = self.size.width;
        &mut self.data[rows.start * w..rows.end * w]
    }

    /// Copy rows `rows` from `other` into `self`, leaving every other row untouched.
    pub(crate) fn copy_rows_from(&mut self, other: &GradientImage, rows: Range<usize>) {
        let w = self.size.width;
        let span = rows.start * w..rows.end * w;
        self.data[span.clone()].copy_from_slice(&other.data[span]);
    }
}
