//! Image file I/O, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageReader::into_dimensions` |
//! | **Decode** | `ImageReader::decode` → RGB8 |
//! | **Encode** | `JpegEncoder` / `PngEncoder` with `L8` samples |
//!
//! The module is split into:
//! - **Parameters**: [`Quality`] and [`OutputFormat`]
//! - **Backend**: [`ImageBackend`] trait, error types, and [`RustBackend`]

pub mod backend;
mod params;
pub mod rust_backend;

pub use backend::{DecodeError, Dimensions, EncodeError, ImageBackend};
pub use params::{OutputFormat, Quality};
pub use rust_backend::RustBackend;
