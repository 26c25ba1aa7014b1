//! Edge detection pipeline.
//!
//! Orchestrates one run: identify → decode → grayscale → gradient → encode.
//! Only the two compute stages are timed; file I/O is excluded so timings
//! compare partitioning strategies rather than codecs.
//!
//! ## Stages
//!
//! ```text
//! input.jpg ──identify──> ImageSize (validated, checked against [image])
//!           ──decode────> RasterImage
//!           ──reduce────> GrayscaleImage      ┐ timed
//!           ──gradient──> GradientImage       ┘
//!           ──encode────> output.jpg / output.png
//! ```
//!
//! There is a full barrier between the reduce and gradient stages: the
//! grayscale image is complete and read-only before any gradient row is
//! computed. The worker pool is built once per run and dropped at the end.

use crate::config::{ConfigError, EdgeConfig, effective_threads};
use crate::grayscale;
use crate::imaging::{DecodeError, EncodeError, ImageBackend, Quality, RustBackend};
use crate::partition::{PartitionError, PartitionStrategy, WorkPartitioner};
use crate::sobel::SobelOperator;
use crate::types::{GradientImage, ImageSize, RasterImage};
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Partition(#[from] PartitionError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Everything a single run needs, resolved from [`EdgeConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub expected_width: Option<usize>,
    pub expected_height: Option<usize>,
    pub threads: usize,
    pub strategy: PartitionStrategy,
    pub clip_threshold: u8,
    pub quality: Quality,
}

impl PipelineOptions {
    /// Build options from a validated config.
    pub fn from_config(config: &EdgeConfig) -> Self {
        Self {
            input: config.io.input.clone(),
            output: config.io.output.clone(),
            expected_width: config.image.width,
            expected_height: config.image.height,
            threads: effective_threads(&config.processing),
            strategy: config.processing.strategy,
            clip_threshold: u8::try_from(config.processing.clip_threshold).unwrap_or(u8::MAX),
            quality: Quality::new(u8::try_from(config.io.quality).unwrap_or(100)),
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_config(&EdgeConfig::default())
    }
}

fn as_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Elapsed wall-clock time of the two compute stages.
///
/// Decode and encode are excluded. Process CPU time is not measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StageTimings {
    #[serde(serialize_with = "as_secs")]
    pub reduce: Duration,
    #[serde(serialize_with = "as_secs")]
    pub gradient: Duration,
}

impl StageTimings {
    pub fn total(&self) -> Duration {
        self.reduce + self.gradient
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub size: ImageSize,
    pub strategy: PartitionStrategy,
    pub threads: usize,
    pub clip_threshold: u8,
    pub timings: StageTimings,
}

/// One strategy's result from [`compare_strategies`].
#[derive(Debug, Clone, Serialize)]
pub struct StrategyComparison {
    pub strategy: PartitionStrategy,
    pub threads: usize,
    pub timings: StageTimings,
    /// Output is byte-identical to the serial result.
    pub matches_serial: bool,
}

/// Reduce `raster` to grayscale and compute its edge map.
///
/// This is the in-memory core of every run. Both stages execute on
/// `partitioner`'s pool.
pub fn detect_edges(
    raster: &RasterImage,
    sobel: &SobelOperator,
    partitioner: &WorkPartitioner,
) -> (GradientImage, StageTimings) {
    let start = Instant::now();
    let gray = grayscale::reduce(raster, partitioner);
    let reduce = start.elapsed();

    let start = Instant::now();
    let gradient = sobel.compute_gradient(&gray, partitioner);
    let gradient_time = start.elapsed();

    log::info!(
        "{} x{}: grayscale {:.6}s, gradient {:.6}s",
        partitioner.strategy(),
        partitioner.threads(),
        reduce.as_secs_f64(),
        gradient_time.as_secs_f64()
    );
    (
        gradient,
        StageTimings {
            reduce,
            gradient: gradient_time,
        },
    )
}

/// Read the input's dimensions and check them against the options.
///
/// Fails before any pixel buffer is allocated when the image is too small or
/// differs from the expected size.
pub fn identify_input(
    backend: &impl ImageBackend,
    options: &PipelineOptions,
) -> Result<ImageSize, PipelineError> {
    let dims = backend.identify(&options.input)?;
    let size = ImageSize::new(dims.width as usize, dims.height as usize)?;
    check_expected_size(&options.input, size, options)?;
    Ok(size)
}

fn check_expected_size(
    path: &Path,
    size: ImageSize,
    options: &PipelineOptions,
) -> Result<(), DecodeError> {
    let expected_width = options.expected_width.unwrap_or(size.width());
    let expected_height = options.expected_height.unwrap_or(size.height());
    if (size.width(), size.height()) != (expected_width, expected_height) {
        return Err(DecodeError::DimensionMismatch {
            path: path.to_path_buf(),
            actual_width: size.width(),
            actual_height: size.height(),
            expected_width,
            expected_height,
        });
    }
    Ok(())
}

/// Identify and decode the input, confirming the decoded size matches the header.
fn load_input(
    backend: &impl ImageBackend,
    options: &PipelineOptions,
) -> Result<RasterImage, PipelineError> {
    let size = identify_input(backend, options)?;
    let raster = backend.decode(&options.input)?;
    if raster.size() != size {
        return Err(DecodeError::DimensionMismatch {
            path: options.input.clone(),
            actual_width: raster.width(),
            actual_height: raster.height(),
            expected_width: size.width(),
            expected_height: size.height(),
        }
        .into());
    }
    log::info!(
        "decoded {} ({}x{})",
        options.input.display(),
        size.width(),
        size.height()
    );
    Ok(raster)
}

/// Run the full pipeline with the production backend.
pub fn run(options: &PipelineOptions) -> Result<RunReport, PipelineError> {
    run_with_backend(&RustBackend::new(), options)
}

/// Run the full pipeline using a specific backend (allows testing with mock).
pub fn run_with_backend(
    backend: &impl ImageBackend,
    options: &PipelineOptions,
) -> Result<RunReport, PipelineError> {
    let partitioner = WorkPartitioner::new(options.strategy, options.threads)?;
    let raster = load_input(backend, options)?;
    let size = raster.size();

    let sobel = SobelOperator::new(options.clip_threshold);
    let (gradient, timings) = detect_edges(&raster, &sobel, &partitioner);
    drop(raster);

    backend.encode_grayscale(&options.output, &gradient, options.quality)?;
    log::info!("wrote {}", options.output.display());

    Ok(RunReport {
        input: options.input.clone(),
        output: options.output.clone(),
        size,
        strategy: partitioner.strategy(),
        threads: partitioner.threads(),
        clip_threshold: sobel.clip_threshold(),
        timings,
    })
}

/// Decode the input once and run every strategy on it with the same thread
/// count, checking each result against the serial one. Nothing is written.
pub fn compare_strategies(
    backend: &impl ImageBackend,
    options: &PipelineOptions,
) -> Result<Vec<StrategyComparison>, PipelineError> {
    let raster = load_input(backend, options)?;
    let sobel = SobelOperator::new(options.clip_threshold);

    let mut baseline: Option<GradientImage> = None;
    let mut results = Vec::with_capacity(PartitionStrategy::ALL.len());
    for strategy in PartitionStrategy::ALL {
        let partitioner = WorkPartitioner::new(strategy, options.threads)?;
        let (gradient, timings) = detect_edges(&raster, &sobel, &partitioner);
        let matches_serial = match &baseline {
            Some(serial) => *serial == gradient,
            None => {
                baseline = Some(gradient);
                true
            }
        };
        if !matches_serial {
            log::warn!("{strategy} output differs from serial");
        }
        results.push(StrategyComparison {
            strategy,
            threads: partitioner.threads(),
            timings,
            matches_serial,
        });
    }
    Ok(results)
}
