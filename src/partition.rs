//! Work partitioning: how the interior of an image is divided among workers.
//!
//! A [`WorkPartitioner`] pairs a [`PartitionStrategy`] with a fixed-size
//! rayon pool. The pool is built once per pipeline run and dropped with the
//! partitioner, so no worker threads outlive a run.
//!
//! ## Range arithmetic
//!
//! Ranges are deterministic and independent of the rayon scheduler:
//!
//! ```text
//! units      = interior rows (H - 2) or interior pixels ((W - 2) * (H - 2))
//! workers    = clamp(threads, 1, units)
//! per_worker = units / workers
//! worker i   = [i * per_worker, (i + 1) * per_worker)
//! last       = [(workers - 1) * per_worker, units)     // absorbs the remainder
//! ```
//!
//! Row ranges are shifted by one so together they cover exactly
//! `1..H - 1`. Ranges never overlap, which is what lets each worker write
//! straight into its own slice of the shared output.

use crate::types::ImageSize;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use thiserror::Error;

/// Upper bound on configurable worker threads.
pub const MAX_THREADS: usize = 256;

#[derive(Error, Debug)]
pub enum PartitionError {
    #[error("thread count must be between 1 and {max}, got {requested}")]
    InvalidThreadCount { requested: usize, max: usize },
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// How the gradient stage divides work and merges results.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum PartitionStrategy {
    /// Contiguous bands of whole rows, written in place.
    #[default]
    RowChunked,
    /// Contiguous ranges of the flattened interior `(y, x)` index space.
    IndexChunked,
    /// Per-worker full-size buffers merged under a mutex.
    PrivateBufferMerge,
    /// One worker, row-major. The reference result.
    Serial,
}

impl PartitionStrategy {
    pub const ALL: [PartitionStrategy; 4] = [
        PartitionStrategy::Serial,
        PartitionStrategy::RowChunked,
        PartitionStrategy::IndexChunked,
        PartitionStrategy::PrivateBufferMerge,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PartitionStrategy::RowChunked => "row-chunked",
            PartitionStrategy::IndexChunked => "index-chunked",
            PartitionStrategy::PrivateBufferMerge => "private-buffer-merge",
            PartitionStrategy::Serial => "serial",
        }
    }
}

impl fmt::Display for PartitionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Split `0..units` into at most `workers` contiguous ranges.
///
/// Every range is non-empty; the last one absorbs `units % workers`.
pub fn chunk_ranges(units: usize, workers: usize) -> Vec<Range<usize>> {
    if units == 0 {
        return Vec::new();
    }
    let workers = workers.clamp(1, units);
    let per_worker = units / workers;
    (0..workers)
        .map(|i| {
            let start = i * per_worker;
            let end = if i == workers - 1 {
                units
            } else {
                start + per_worker
            };
            start..end
        })
        .collect()
}

/// Interior row ranges for `height` split across `workers`, covering `1..height - 1`.
pub fn row_ranges(size: ImageSize, workers: usize) -> Vec<Range<usize>> {
    chunk_ranges(size.height() - 2, workers)
        .into_iter()
        .map(|r| r.start + 1..r.end + 1)
        .collect()
}

/// Ranges of the flattened interior index space, `0..(W - 2) * (H - 2)`.
pub fn index_ranges(size: ImageSize, workers: usize) -> Vec<Range<usize>> {
    chunk_ranges(size.interior_pixel_count(), workers)
}

/// Strategy plus the worker pool that executes it.
#[derive(Debug)]
pub struct WorkPartitioner {
    strategy: PartitionStrategy,
    threads: usize,
    pool: Option<rayon::ThreadPool>,
}

impl WorkPartitioner {
    /// Build a partitioner with a dedicated pool of `threads` workers.
    ///
    /// The serial strategy ignores `threads` and runs on the calling thread.
    pub fn new(strategy: PartitionStrategy, threads: usize) -> Result<Self, PartitionError> {
        if threads == 0 || threads > MAX_THREADS {
            return Err(PartitionError::InvalidThreadCount {
                requested: threads,
                max: MAX_THREADS,
            });
        }
        if strategy == PartitionStrategy::Serial {
            return Ok(Self::serial());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("sobel-worker-{i}"))
            .build()?;
        log::debug!("built {strategy} pool with {threads} workers");
        Ok(Self {
            strategy,
            threads,
            pool: Some(pool),
        })
    }

    pub fn serial() -> Self {
        Self {
            strategy: PartitionStrategy::Serial,
            threads: 1,
            pool: None,
        }
    }

    pub fn strategy(&self) -> PartitionStrategy {
        self.strategy
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Row ranges each worker owns for writing.
    pub fn row_ranges(&self, size: ImageSize) -> Vec<Range<usize>> {
        row_ranges(size, self.threads)
    }

    /// Flattened interior index ranges each worker owns for writing.
    pub fn index_ranges(&self, size: ImageSize) -> Vec<Range<usize>> {
        index_ranges(size, self.threads)
    }

    /// Run `op` inside the worker pool, or inline for the serial strategy.
    ///
    /// Blocks until `op` and every task it spawned have finished.
    pub(crate) fn install<R, OP>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

/// Split `data` into the disjoint mutable sub-slices named by `spans`.
///
/// `spans` must be sorted, non-overlapping and within bounds; bytes between
/// spans are skipped.
pub(crate) fn split_spans_mut<'a>(data: &'a mut [u8], spans: &[Range<usize>]) -> Vec<&'a mut [u8]> {
    let mut rest = data;
    let mut consumed = 0;
    let mut out = Vec::with_capacity(spans.len());
    for span in spans {
        let (_, tail) = std::mem::take(&mut rest).split_at_mut(span.start - consumed);
        let (piece, tail) = tail.split_at_mut(span.len());
        out.push(piece);
        rest = tail;
        consumed = span.end;
    }
    out
}
