//! growth-probe CLI - measures where `Vec` reallocates and what that append costs
//!
//! Usage:
//!   growth-probe [--trials <n>] [--policy <last|first>] [--output <file.svg|file.png>]
//!
//! Without `--output`, the histograms are printed to stdout as text.

use std::{alloc::System, io, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use growth_probe::{
    run, AllocatorFootprint, Allocator, Config, FootprintSource, PlotRenderer, Renderer,
    ReportedFootprint, TextRenderer, ThresholdPolicy, DEFAULT_BINS, DEFAULT_TRIALS,
    DEFAULT_UPPER_BOUND,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: Allocator<System> = Allocator::system();

/// The container under test.
type Subject = Vec<usize>;

#[derive(Parser)]
#[command(name = "growth-probe")]
#[command(
    author,
    version,
    about = "Measure the cost of the append that makes a Vec reallocate",
    long_about = None
)]
struct Cli {
    /// Number of element counts to scan for capacity transitions
    #[arg(long, default_value_t = DEFAULT_UPPER_BOUND)]
    upper_bound: usize,

    /// Timed trials per sample set
    #[arg(short, long, default_value_t = DEFAULT_TRIALS)]
    trials: usize,

    /// Histogram bins
    #[arg(short, long, default_value_t = DEFAULT_BINS)]
    bins: usize,

    /// Which capacity transition to time
    #[arg(long, value_enum, default_value = "last")]
    policy: Policy,

    /// How container footprints are measured
    #[arg(long, value_enum, default_value = "allocator")]
    footprint: Source,

    /// Override the fixed header size, in bytes
    #[arg(long)]
    overhead: Option<usize>,

    /// Override the per-element size, in bytes
    #[arg(long)]
    element_size: Option<usize>,

    /// Write the chart to this file (.svg or .png) instead of printing it
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy)]
enum Policy {
    First,
    Last,
}

#[derive(ValueEnum, Clone, Copy)]
enum Source {
    Allocator,
    Reported,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            upper_bound: self.upper_bound,
            trials: self.trials,
            bins: self.bins,
            policy: match self.policy {
                Policy::First => ThresholdPolicy::First,
                Policy::Last => ThresholdPolicy::Last,
            },
            overhead: self.overhead,
            element_size: self.element_size,
            footprint: match self.footprint {
                Source::Allocator => FootprintSource::Allocator,
                Source::Reported => FootprintSource::Reported,
            },
            output: self.output.clone(),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = cli.config();

    let mut renderer: Box<dyn Renderer> = match &config.output {
        Some(path) => Box::new(
            PlotRenderer::for_path(path)
                .with_context(|| format!("unusable output path {}", path.display()))?,
        ),
        None => Box::new(TextRenderer::new(io::stdout())),
    };

    let report = match config.footprint {
        FootprintSource::Allocator => {
            let footprint = AllocatorFootprint::register()
                .context("failed to set up allocator-backed footprints")?;
            run::<Subject, _, _>(&config, &footprint, renderer.as_mut())
        }
        FootprintSource::Reported => {
            run::<Subject, _, _>(&config, &ReportedFootprint, renderer.as_mut())
        }
    }
    .context("measurement failed")?;

    let capacities: Vec<usize> = report
        .probe
        .transitions()
        .iter()
        .map(|t| t.capacity)
        .collect();
    info!(
        threshold = report.probe.threshold(),
        ?capacities,
        growth_factors = ?report.probe.growth_factors(),
        "done"
    );

    Ok(())
}
