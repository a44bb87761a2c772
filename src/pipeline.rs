use std::{error, fmt};

use tracing::{info, info_span};

use crate::{
    measure_threshold, probe_capacity, Chart, Config, ConfigError, Container, Footprint,
    Histogram, HistogramError, ProbeError, ProbeReport, RenderError, Renderer, ThresholdTimings,
    TimingError,
};

/// Everything measured by a [`run`].
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Outcome of the capacity probe.
    pub probe: ProbeReport,
    /// Append timings on both sides of the threshold.
    pub timings: ThresholdTimings,
}

/// Errors raised by [`run`], one variant per phase.
#[derive(Debug)]
pub enum PipelineError {
    /// The configuration is unusable.
    Config(ConfigError),
    /// The capacity probe failed.
    Probe(ProbeError),
    /// Timing could not start.
    Timing(TimingError),
    /// The samples could not be binned.
    Histogram(HistogramError),
    /// The chart could not be rendered.
    Render(RenderError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Config(e) => write!(f, "invalid configuration: {}", e),
            PipelineError::Probe(e) => write!(f, "capacity probe failed: {}", e),
            PipelineError::Timing(e) => write!(f, "timing failed: {}", e),
            PipelineError::Histogram(e) => write!(f, "binning failed: {}", e),
            PipelineError::Render(e) => write!(f, "rendering failed: {}", e),
        }
    }
}

impl error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            PipelineError::Config(e) => Some(e),
            PipelineError::Probe(e) => Some(e),
            PipelineError::Timing(e) => Some(e),
            PipelineError::Histogram(e) => Some(e),
            PipelineError::Render(e) => Some(e),
        }
    }
}

impl From<ConfigError> for PipelineError {
    fn from(e: ConfigError) -> Self {
        PipelineError::Config(e)
    }
}

impl From<ProbeError> for PipelineError {
    fn from(e: ProbeError) -> Self {
        PipelineError::Probe(e)
    }
}

impl From<TimingError> for PipelineError {
    fn from(e: TimingError) -> Self {
        PipelineError::Timing(e)
    }
}

impl From<HistogramError> for PipelineError {
    fn from(e: HistogramError) -> Self {
        PipelineError::Histogram(e)
    }
}

impl From<RenderError> for PipelineError {
    fn from(e: RenderError) -> Self {
        PipelineError::Render(e)
    }
}

/// Probes `C` for its capacity threshold, times appends around it, and renders the timings.
///
/// # Errors
/// Fails with the error of the first phase that fails; later phases do not run.
pub fn run<C, F, R>(
    config: &Config,
    footprint: &F,
    renderer: &mut R,
) -> Result<Report, PipelineError>
where
    C: Container,
    F: Footprint<C>,
    R: Renderer + ?Sized,
{
    config.validate()?;

    let probe = {
        let _span = info_span!("probe", upper_bound = config.upper_bound).entered();
        probe_capacity::<C, F>(&config.probe_config::<C>(), footprint)?
    };

    let timings = {
        let _span = info_span!("timing", threshold = probe.threshold(), trials = config.trials)
            .entered();
        measure_threshold::<C>(probe.threshold(), config.trials)?
    };

    let histogram = Histogram::new(
        config.bins,
        &[
            (timings.at_threshold.label(), timings.at_threshold.seconds()),
            (
                timings.below_threshold.label(),
                timings.below_threshold.seconds(),
            ),
        ],
    )?;
    renderer.render(&Chart::timings(probe.threshold(), histogram))?;
    info!(threshold = probe.threshold(), "measurement complete");

    Ok(Report { probe, timings })
}
