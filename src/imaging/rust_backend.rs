//! Pure Rust image backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG) | `ImageReader::decode`, then `into_rgb8` for non-RGB8 color inputs |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder`, `L8` samples |
//! | Encode → PNG | `image::codecs::png::PngEncoder`, `L8` samples |
//!
//! Formats are sniffed from file contents on read; the output format follows
//! the destination extension. Decoding runs without the `image` crate's
//! default 512 MiB allocation limit; input size is checked from the header
//! before decode.

use super::backend::{DecodeError, Dimensions, EncodeError, ImageBackend};
use super::params::{OutputFormat, Quality};
use crate::types::{GradientImage, ImageSize, RasterImage};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Production backend. Stateless.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn open_reader(path: &Path) -> Result<ImageReader<BufReader<File>>, DecodeError> {
    let open_err = |source| DecodeError::Open {
        path: path.to_path_buf(),
        source,
    };
    ImageReader::open(path)
        .map_err(open_err)?
        .with_guessed_format()
        .map_err(open_err)
}

fn decode_err(path: &Path) -> impl FnOnce(image::ImageError) -> DecodeError + '_ {
    move |source| DecodeError::Decode {
        path: path.to_path_buf(),
        source,
    }
}

fn encode_err(path: &Path) -> impl FnOnce(image::ImageError) -> EncodeError + '_ {
    move |source| EncodeError::Encode {
        path: path.to_path_buf(),
        source,
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, DecodeError> {
        let (width, height) = open_reader(path)?
            .into_dimensions()
            .map_err(decode_err(path))?;
        Ok(Dimensions { width, height })
    }

    fn decode(&self, path: &Path) -> Result<RasterImage, DecodeError> {
        let mut reader = open_reader(path)?;
        reader.no_limits();
        let img = reader.decode().map_err(decode_err(path))?;

        let color = img.color();
        if !color.has_color() {
            return Err(DecodeError::NotRgb {
                path: path.to_path_buf(),
                channels: color.channel_count(),
            });
        }

        let rgb = match img {
            DynamicImage::ImageRgb8(buf) => buf,
            other => {
                log::debug!("converting {color:?} input to RGB8");
                other.into_rgb8()
            }
        };
        let size = ImageSize::new(rgb.width() as usize, rgb.height() as usize)?;
        Ok(RasterImage::from_raw(size, rgb.into_raw())
            .expect("RgbImage holds exactly width * height * 3 samples"))
    }

    fn encode_grayscale(
        &self,
        path: &Path,
        image: &GradientImage,
        quality: Quality,
    ) -> Result<(), EncodeError> {
        let format = OutputFormat::from_path(path).ok_or_else(|| EncodeError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default(),
        })?;

        let file = File::create(path).map_err(|source| EncodeError::Create {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        let (width, height) = (image.width() as u32, image.height() as u32);

        match format {
            OutputFormat::Jpeg => JpegEncoder::new_with_quality(&mut writer, quality.value())
                .write_image(image.as_raw(), width, height, ExtendedColorType::L8),
            OutputFormat::Png => PngEncoder::new(&mut writer).write_image(
                image.as_raw(),
                width,
                height,
                ExtendedColorType::L8,
            ),
        }
        .map_err(encode_err(path))?;

        writer
            .flush()
            .map_err(|e| encode_err(path)(image::ImageError::IoError(e)))
    }
}
