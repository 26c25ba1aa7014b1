//! CLI output formatting for all commands.
//!
//! # Output Format
//!
//! ## Run
//!
//! ```text
//! Large_image.jpg → Large_image_edge.jpg
//!     Size: 30000x22943
//!     Strategy: row-chunked (8 threads)
//!     Clip threshold: 255
//!     Grayscale: 0.412000 seconds
//!     Gradient: 1.904000 seconds
//!     Total: 2.316000 seconds
//! ```
//!
//! ## Check
//!
//! ```text
//! Large_image.jpg
//!     Size: 30000x22943
//!     Output: Large_image_edge.jpg
//!     Strategy: row-chunked (8 threads)
//!     Clip threshold: 255
//! Config OK
//! ```
//!
//! ## Compare
//!
//! ```text
//! Large_image.jpg (8 threads)
//! 001 serial                 9.120000 seconds  baseline
//! 002 row-chunked            2.316000 seconds  identical  3.94x
//! 003 index-chunked          2.401000 seconds  identical  3.80x
//! 004 private-buffer-merge   3.050000 seconds  identical  2.99x
//! All strategies match serial
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure and do no I/O.

use crate::partition::PartitionStrategy;
use crate::pipeline::{PipelineOptions, RunReport, StrategyComparison};
use crate::types::ImageSize;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn format_seconds(duration: Duration) -> String {
    format!("{:.6} seconds", duration.as_secs_f64())
}

fn format_size(size: ImageSize) -> String {
    format!("{}x{}", size.width(), size.height())
}

fn format_strategy(strategy: PartitionStrategy, threads: usize) -> String {
    match threads {
        1 => format!("{strategy} (1 thread)"),
        n => format!("{strategy} ({n} threads)"),
    }
}

// ============================================================================
// run
// ============================================================================

/// Format the report of a completed pipeline run.
pub fn format_run_report(report: &RunReport) -> Vec<String> {
    vec![
        format!(
            "{} \u{2192} {}",
            report.input.display(),
            report.output.display()
        ),
        format!("    Size: {}", format_size(report.size)),
        format!(
            "    Strategy: {}",
            format_strategy(report.strategy, report.threads)
        ),
        format!("    Clip threshold: {}", report.clip_threshold),
        format!("    Grayscale: {}", format_seconds(report.timings.reduce)),
        format!("    Gradient: {}", format_seconds(report.timings.gradient)),
        format!("    Total: {}", format_seconds(report.timings.total())),
    ]
}

pub fn print_run_report(report: &RunReport) {
    for line in format_run_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// check
// ============================================================================

/// Format the result of identifying the input under the resolved options.
pub fn format_check(options: &PipelineOptions, size: ImageSize) -> Vec<String> {
    vec![
        options.input.display().to_string(),
        format!("    Size: {}", format_size(size)),
        format!("    Output: {}", options.output.display()),
        format!(
            "    Strategy: {}",
            format_strategy(options.strategy, options.threads)
        ),
        format!("    Clip threshold: {}", options.clip_threshold),
        "Config OK".to_string(),
    ]
}

pub fn print_check(options: &PipelineOptions, size: ImageSize) {
    for line in format_check(options, size) {
        println!("{}", line);
    }
}

// ============================================================================
// compare
// ============================================================================

/// Format a strategy comparison table.
///
/// Speedups are relative to the serial row; the serial row itself is
/// labelled `baseline`.
pub fn format_comparison(input: &Path, threads: usize, results: &[StrategyComparison]) -> Vec<String> {
    let mut lines = vec![format!("{} ({threads} threads)", input.display())];
    let serial_total = results
        .iter()
        .find(|r| r.strategy == PartitionStrategy::Serial)
        .map(|r| r.timings.total());

    for (i, result) in results.iter().enumerate() {
        let total = result.timings.total();
        let mut line = format!(
            "{} {:<22} {}",
            format_index(i + 1),
            result.strategy.name(),
            format_seconds(total)
        );
        if result.strategy == PartitionStrategy::Serial {
            line.push_str("  baseline");
        } else {
            line.push_str(if result.matches_serial {
                "  identical"
            } else {
                "  DIFFERS"
            });
            if let Some(serial) = serial_total
                && !total.is_zero()
            {
                line.push_str(&format!(
                    "  {:.2}x",
                    serial.as_secs_f64() / total.as_secs_f64()
                ));
            }
        }
        lines.push(line);
    }

    let mismatches = results.iter().filter(|r| !r.matches_serial).count();
    lines.push(match mismatches {
        0 => "All strategies match serial".to_string(),
        1 => "1 strategy differs from serial".to_string(),
        n => format!("{n} strategies differ from serial"),
    });
    lines
}

pub fn print_comparison(input: &Path, threads: usize, results: &[StrategyComparison]) {
    for line in format_comparison(input, threads, results) {
        println!("{}", line);
    }
}
