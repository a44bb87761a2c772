//! Append latency measurements.
use std::{
    error, fmt,
    hint::black_box,
    time::{Duration, Instant},
};

use tracing::info;

use crate::Container;

/// Default number of independent trials per sample set.
pub const DEFAULT_TRIALS: usize = 1000;

/// Times `stmt` once per trial, on a value freshly produced by `setup`.
///
/// Only `stmt` is inside the timed interval: `setup` runs before the clock starts and the value
/// is dropped after it stops. Durations are per trial, never cumulative.
pub fn repeat<S, Setup, Stmt>(trials: usize, mut setup: Setup, mut stmt: Stmt) -> Vec<Duration>
where
    Setup: FnMut() -> S,
    Stmt: FnMut(&mut S),
{
    let mut durations = Vec::with_capacity(trials);
    for _ in 0..trials {
        let mut subject = setup();

        let start = Instant::now();
        stmt(black_box(&mut subject));
        let elapsed = start.elapsed();

        durations.push(elapsed);
        drop(black_box(subject));
    }
    durations
}

/// Durations collected for one side of a capacity boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingSamples {
    label: String,
    pre_size: usize,
    durations: Vec<Duration>,
}

impl TimingSamples {
    /// Creates a sample set from raw durations.
    pub fn new(label: impl Into<String>, pre_size: usize, durations: Vec<Duration>) -> Self {
        Self {
            label: label.into(),
            pre_size,
            durations,
        }
    }

    /// Legend label for this sample set.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Length of the container each append was made onto.
    pub fn pre_size(&self) -> usize {
        self.pre_size
    }

    /// The raw durations, in trial order.
    pub fn durations(&self) -> &[Duration] {
        &self.durations
    }

    /// The durations as seconds, in trial order.
    pub fn seconds(&self) -> Vec<f64> {
        self.durations.iter().map(Duration::as_secs_f64).collect()
    }

    /// Number of trials.
    pub fn len(&self) -> usize {
        self.durations.len()
    }

    /// Whether no trials were recorded.
    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    /// Summary statistics in seconds, or `None` for an empty sample set.
    pub fn summary(&self) -> Option<Summary> {
        Summary::from_seconds(&self.seconds())
    }
}

/// Descriptive statistics of a sample set, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// Number of samples.
    pub count: usize,
    /// Smallest sample.
    pub min: f64,
    /// Largest sample.
    pub max: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Median; the mean of the two middle samples for even counts.
    pub median: f64,
}

impl Summary {
    /// Summarizes `samples`, or returns `None` if there are none.
    pub fn from_seconds(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mid = count / 2;
        let median = if count % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Some(Self {
            count,
            min: sorted[0],
            max: sorted[count - 1],
            mean: sorted.iter().sum::<f64>() / count as f64,
            median,
        })
    }
}

/// Times one append onto a fresh container of `pre_size` elements, `trials` times.
pub fn measure_append<C: Container>(
    label: impl Into<String>,
    pre_size: usize,
    trials: usize,
) -> TimingSamples {
    let durations = repeat(trials, || C::filled(pre_size), C::grow_by_one);
    TimingSamples::new(label, pre_size, durations)
}

/// Errors raised by [`measure_threshold`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingError {
    /// A threshold of zero leaves no smaller container to compare against.
    ZeroThreshold,
    /// At least one trial is needed per sample set.
    ZeroTrials,
}

impl fmt::Display for TimingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimingError::ZeroThreshold => {
                f.pad("threshold must be at least 1 to time appends below it")
            }
            TimingError::ZeroTrials => f.pad("trial count must be non-zero"),
        }
    }
}

impl error::Error for TimingError {}

/// Append timings on both sides of a capacity threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTimings {
    /// Appends onto containers of `S` elements, which reallocate.
    pub at_threshold: TimingSamples,
    /// Appends onto containers of `S - 1` elements, which do not.
    pub below_threshold: TimingSamples,
}

/// Times appends onto containers of `threshold` and `threshold - 1` elements.
///
/// # Errors
/// See [`TimingError`].
pub fn measure_threshold<C: Container>(
    threshold: usize,
    trials: usize,
) -> Result<ThresholdTimings, TimingError> {
    if threshold == 0 {
        return Err(TimingError::ZeroThreshold);
    }
    if trials == 0 {
        return Err(TimingError::ZeroTrials);
    }

    let at_threshold = measure_append::<C>("Size S to S+1", threshold, trials);
    let below_threshold = measure_append::<C>("Size S-1 to S", threshold - 1, trials);

    for samples in [&at_threshold, &below_threshold] {
        if let Some(summary) = samples.summary() {
            info!(
                label = samples.label(),
                pre_size = samples.pre_size(),
                trials = summary.count,
                min = summary.min,
                median = summary.median,
                mean = summary.mean,
                max = summary.max,
                "append timings collected"
            );
        }
    }

    Ok(ThresholdTimings {
        at_threshold,
        below_threshold,
    })
}
