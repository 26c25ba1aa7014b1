//! # Sobel Edges
//!
//! Edge maps for very large raster images. An RGB image is reduced to
//! grayscale, filtered with a 3x3 Sobel operator, and written back out as a
//! single-channel JPEG or PNG.
//!
//! # Architecture: Two Compute Stages Between Thin I/O
//!
//! ```text
//! decode      input.jpg       →  RasterImage      (image crate)
//! reduce      RasterImage     →  GrayscaleImage   (parallel, timed)
//! gradient    GrayscaleImage  →  GradientImage    (parallel, timed)
//! encode      GradientImage   →  output.jpg       (image crate)
//! ```
//!
//! The two compute stages are pure functions of their input and the chosen
//! [`partition::PartitionStrategy`]. Every strategy and every thread count
//! produces byte-identical output, so the serial strategy doubles as the
//! correctness oracle in tests and in `sobel-edges compare`.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | `ImageSize` and the three owned pixel buffers |
//! | [`grayscale`] | Fixed-weight luma reduction |
//! | [`sobel`] | 3x3 Sobel gradient magnitude with a configurable clip threshold |
//! | [`partition`] | Partition strategies, range arithmetic, and the per-run worker pool |
//! | [`pipeline`] | `run`, `detect_edges`, `compare_strategies`, and run reports |
//! | [`imaging`] | Decode/encode behind the [`imaging::ImageBackend`] trait |
//! | [`config`] | Layered `sobel.toml` loading, validation, and the stock config |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Disjoint Writes Instead of Locks
//!
//! Every worker owns a disjoint range of output rows (or a disjoint span of
//! the flattened interior). The output buffer is split with `split_at_mut`
//! before the workers start, so the borrow checker proves there is no overlap
//! and no synchronization is needed on the hot path. The one strategy that
//! does lock, `private-buffer-merge`, takes the lock once per worker, only to
//! copy its finished rows.
//!
//! ## One Pool Per Run
//!
//! The rayon pool is built by [`partition::WorkPartitioner`] with exactly the
//! configured number of workers and dropped when the run ends. Nothing touches
//! rayon's global pool, so several runs with different thread counts can
//! coexist in one process (which `compare` relies on).
//!
//! ## Sizes Are Validated Once
//!
//! [`types::ImageSize`] is the only way to size a buffer, and its constructor
//! rejects images with a side of 2 pixels or fewer. Compute code can then
//! index `1..W-1` and `1..H-1` without further checks.
//!
//! ## Config Layering (Stock → File → Flags)
//!
//! ```text
//! stock defaults      ← config::stock_defaults_value()
//! sobel.toml          ← --config FILE, or ./sobel.toml when present
//! command-line flags  ← --threads, --strategy, ... (SOBEL_THREADS env)
//! ```
//!
//! Layers are merged as TOML tables by [`config::merge_toml`] before a single
//! deserialize-and-validate step, so every layer obeys the same rules.

pub mod config;
pub mod grayscale;
pub mod imaging;
pub mod output;
pub mod partition;
pub mod pipeline;
pub mod sobel;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
