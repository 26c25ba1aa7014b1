//! Image I/O backend trait and its error types.
//!
//! The [`ImageBackend`] trait is the pipeline's only view of the filesystem:
//! identify an input's dimensions, decode it to a [`RasterImage`], and encode
//! a [`GradientImage`] as a single-channel file.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording mock in this module's `tests`.

use super::params::Quality;
use crate::config::ConfigError;
use crate::types::{GradientImage, RasterImage};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("{} has {channels} channel(s); an RGB image is required", .path.display())]
    NotRgb { path: PathBuf, channels: u8 },
    #[error("unusable image size: {0}")]
    InvalidSize(#[from] ConfigError),
    #[error(
        "{} is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}",
        .path.display()
    )]
    DimensionMismatch {
        path: PathBuf,
        actual_width: usize,
        actual_height: usize,
        expected_width: usize,
        expected_height: usize,
    },
}

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("cannot create {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(
        "unsupported output format {extension:?} for {} (use .jpg, .jpeg or .png)",
        .path.display()
    )]
    UnsupportedFormat { path: PathBuf, extension: String },
    #[error("cannot encode {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Image decode/encode collaborator.
///
/// `Sync` so a backend can be shared by reference across worker threads.
pub trait ImageBackend: Sync {
    /// Read the image dimensions without decoding pixel data.
    fn identify(&self, path: &Path) -> Result<Dimensions, DecodeError>;

    /// Decode an image file into 8-bit RGB samples.
    fn decode(&self, path: &Path) -> Result<RasterImage, DecodeError>;

    /// Encode a single-channel edge map. The format follows the extension of `path`.
    fn encode_grayscale(
        &self,
        path: &Path,
        image: &GradientImage,
        quality: Quality,
    ) -> Result<(), EncodeError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::test_helpers::{noise_raster, size};
    use std::sync::Mutex;

    /// Mock backend that serves a preset raster and records every call.
    /// Uses Mutex (not RefCell) so it is Sync.
    #[derive(Default)]
    pub struct MockBackend {
        pub raster: Option<RasterImage>,
        /// Reported by `identify` instead of the raster's own size.
        pub dimensions: Option<Dimensions>,
        pub fail_encode: bool,
        pub operations: Mutex<Vec<RecordedOp>>,
        pub encoded: Mutex<Vec<GradientImage>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Decode(String),
        Encode {
            output: String,
            width: usize,
            height: usize,
            quality: u8,
        },
    }

    impl MockBackend {
        pub fn with_raster(raster: RasterImage) -> Self {
            Self {
                raster: Some(raster),
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn encoded(&self) -> Vec<GradientImage> {
            self.encoded.lock().unwrap().clone()
        }

        fn missing(path: &Path) -> DecodeError {
            DecodeError::Open {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no mock raster"),
            }
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, DecodeError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(path.to_string_lossy().to_string()));
            if let Some(dims) = self.dimensions {
                return Ok(dims);
            }
            let raster = self.raster.as_ref().ok_or_else(|| Self::missing(path))?;
            Ok(Dimensions {
                width: raster.width() as u32,
                height: raster.height() as u32,
            })
        }

        fn decode(&self, path: &Path) -> Result<RasterImage, DecodeError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Decode(path.to_string_lossy().to_string()));
            self.raster.clone().ok_or_else(|| Self::missing(path))
        }

        fn encode_grayscale(
            &self,
            path: &Path,
            image: &GradientImage,
            quality: Quality,
        ) -> Result<(), EncodeError> {
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                output: path.to_string_lossy().to_string(),
                width: image.width(),
                height: image.height(),
                quality: quality.value(),
            });
            if self.fail_encode {
                return Err(EncodeError::Create {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::PermissionDenied,
                        "read-only mock",
                    ),
                });
            }
            self.encoded.lock().unwrap().push(image.clone());
            Ok(())
        }
    }

    #[test]
    fn mock_records_identify_and_decode() {
        let backend = MockBackend::with_raster(noise_raster(size(8, 6), 1));

        let dims = backend.identify(Path::new("/in/image.jpg")).unwrap();
        assert_eq!(dims, Dimensions { width: 8, height: 6 });
        backend.decode(Path::new("/in/image.jpg")).unwrap();

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "/in/image.jpg"));
        assert!(matches!(&ops[1], RecordedOp::Decode(p) if p == "/in/image.jpg"));
    }

    #[test]
    fn mock_without_raster_fails_decode() {
        let backend = MockBackend::default();
        let result = backend.decode(Path::new("/missing.jpg"));
        assert!(matches!(result, Err(DecodeError::Open { .. })));
    }

    #[test]
    fn mock_records_encode() {
        let backend = MockBackend::default();
        let image = GradientImage::new(size(4, 3));
        backend
            .encode_grayscale(Path::new("/out/edges.jpg"), &image, Quality::new(80))
            .unwrap();

        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Encode {
                output: "/out/edges.jpg".into(),
                width: 4,
                height: 3,
                quality: 80,
            }]
        );
        assert_eq!(backend.encoded(), vec![image]);
    }

    #[test]
    fn decode_error_messages_name_the_path() {
        let err = DecodeError::NotRgb {
            path: "gray.png".into(),
            channels: 1,
        };
        assert_eq!(
            err.to_string(),
            "gray.png has 1 channel(s); an RGB image is required"
        );
    }
}
