use clap::{Parser, Subcommand};
use sobel_edges::config;
use sobel_edges::imaging::RustBackend;
use sobel_edges::output;
use sobel_edges::partition::PartitionStrategy;
use sobel_edges::pipeline::{self, PipelineOptions};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sobel-edges")]
#[command(about = "Parallel Sobel edge detection for very large images")]
#[command(long_about = "\
Parallel Sobel edge detection for very large images

Reads an RGB image, reduces it to grayscale with fixed luma weights
(0.30 R + 0.59 G + 0.11 B), applies a 3x3 Sobel filter and writes the
gradient magnitude as a grayscale JPEG or PNG.

Work is split across a pool of worker threads using one of four strategies.
Every strategy produces byte-identical output:

  row-chunked           contiguous bands of rows, written in place
  index-chunked         contiguous ranges of interior pixel indices
  private-buffer-merge  per-worker buffers copied in under a lock
  serial                one worker, no thread pool

Settings are layered: stock defaults, then sobel.toml (or --config), then
the flags below. Run 'sobel-edges gen-config' for a documented sobel.toml.
Set RUST_LOG=info to log stage timings.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./sobel.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// RGB input image
    #[arg(long, global = true)]
    input: Option<PathBuf>,

    /// Edge map output (.jpg, .jpeg or .png)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Expected input width; other sizes are rejected
    #[arg(long, global = true)]
    width: Option<u32>,

    /// Expected input height; other sizes are rejected
    #[arg(long, global = true)]
    height: Option<u32>,

    /// Worker threads (default: number of CPU cores)
    #[arg(long, env = "SOBEL_THREADS", global = true)]
    threads: Option<u32>,

    /// Partitioning strategy
    #[arg(long, value_enum, global = true)]
    strategy: Option<PartitionStrategy>,

    /// Gradient magnitudes above this become 255 (0-255)
    #[arg(long, global = true)]
    clip_threshold: Option<u32>,

    /// JPEG quality (1-100)
    #[arg(long, global = true)]
    quality: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: decode → grayscale → gradient → encode
    Run {
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate config and identify the input without processing
    Check,
    /// Run every strategy on the input and compare timings and output
    Compare,
    /// Print a stock sobel.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match try_main(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn try_main(cli: Cli) -> Result<(), Box<dyn Error>> {
    match &cli.command {
        Command::Run { json } => {
            let options = load_options(&cli)?;
            let report = pipeline::run(&options)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_run_report(&report);
            }
        }
        Command::Check => {
            let options = load_options(&cli)?;
            let size = pipeline::identify_input(&RustBackend::new(), &options)?;
            output::print_check(&options, size);
        }
        Command::Compare => {
            let options = load_options(&cli)?;
            let results = pipeline::compare_strategies(&RustBackend::new(), &options)?;
            output::print_comparison(&options.input, options.threads, &results);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn load_options(cli: &Cli) -> Result<PipelineOptions, config::ConfigError> {
    let config = config::load_config(cli.config.as_deref(), Path::new("."), cli_overlay(cli))?;
    log::debug!("resolved config: {config:?}");
    Ok(PipelineOptions::from_config(&config))
}

/// Collect the flags that were given into a TOML overlay for the config layers.
fn cli_overlay(cli: &Cli) -> Option<toml::Value> {
    let path = |p: &Option<PathBuf>| p.as_ref().map(|p| toml::Value::from(p.to_string_lossy().into_owned()));
    let int = |n: Option<u32>| n.map(|n| toml::Value::from(i64::from(n)));

    let mut table = toml::Table::new();
    set(&mut table, "image", "width", int(cli.width));
    set(&mut table, "image", "height", int(cli.height));
    set(&mut table, "io", "input", path(&cli.input));
    set(&mut table, "io", "output", path(&cli.output));
    set(&mut table, "io", "quality", int(cli.quality));
    set(&mut table, "processing", "threads", int(cli.threads));
    set(
        &mut table,
        "processing",
        "strategy",
        cli.strategy.map(|s| toml::Value::from(s.name())),
    );
    set(&mut table, "processing", "clip_threshold", int(cli.clip_threshold));

    (!table.is_empty()).then_some(toml::Value::Table(table))
}

fn set(table: &mut toml::Table, section: &str, key: &str, value: Option<toml::Value>) {
    let Some(value) = value else { return };
    if let toml::Value::Table(section) = table
        .entry(section)
        .or_insert_with(|| toml::Value::Table(toml::Table::new()))
    {
        section.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn overlay_is_none_without_flags() {
        let cli = Cli::try_parse_from(["sobel-edges", "run"]).unwrap();
        assert!(cli_overlay(&cli).is_none());
    }

    #[test]
    fn overlay_maps_flags_to_sections() {
        let cli = Cli::try_parse_from([
            "sobel-edges",
            "--input",
            "in.png",
            "--strategy",
            "private-buffer-merge",
            "--threads",
            "3",
            "run",
            "--json",
        ])
        .unwrap();
        let overlay = cli_overlay(&cli).unwrap();

        assert_eq!(overlay["io"]["input"].as_str(), Some("in.png"));
        assert_eq!(
            overlay["processing"]["strategy"].as_str(),
            Some("private-buffer-merge")
        );
        assert_eq!(overlay["processing"]["threads"].as_integer(), Some(3));
        assert!(overlay.get("image").is_none());
        assert!(matches!(cli.command, Command::Run { json: true }));
    }

    #[test]
    fn overlay_resolves_into_config() {
        let cli = Cli::try_parse_from([
            "sobel-edges",
            "compare",
            "--clip-threshold",
            "128",
            "--quality",
            "70",
        ])
        .unwrap();
        let config = config::resolve_config(config::stock_defaults_value(), cli_overlay(&cli)).unwrap();

        assert_eq!(config.processing.clip_threshold, 128);
        assert_eq!(config.io.quality, 70);
    }
}
