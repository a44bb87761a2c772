use std::{error, fmt};

/// Errors raised while binning samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistogramError {
    /// The bin count is zero.
    NoBins,
    /// None of the series hold any samples.
    NoSamples,
    /// A sample is NaN or infinite.
    NonFinite,
}

impl fmt::Display for HistogramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistogramError::NoBins => f.pad("histogram needs at least one bin"),
            HistogramError::NoSamples => f.pad("histogram needs at least one sample"),
            HistogramError::NonFinite => f.pad("histogram samples must be finite"),
        }
    }
}

impl error::Error for HistogramError {}

/// Per-bin counts of one series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramSeries {
    /// Legend label.
    pub label: String,
    /// Number of samples in each bin.
    pub counts: Vec<usize>,
}

/// Several series binned over the same equal-width edges.
///
/// Sharing the edges keeps the bars of overlaid series directly comparable.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    edges: Vec<f64>,
    series: Vec<HistogramSeries>,
}

impl Histogram {
    /// Bins every series into `bins` equal-width bins spanning the smallest to the largest sample
    /// across all series.
    ///
    /// Each bin is half-open except the last, which also includes the largest sample. If every
    /// sample has the same value `v`, the edges span `v - 0.5 ..= v + 0.5`.
    pub fn new<L, S>(bins: usize, series: &[(L, S)]) -> Result<Self, HistogramError>
    where
        L: AsRef<str>,
        S: AsRef<[f64]>,
    {
        if bins == 0 {
            return Err(HistogramError::NoBins);
        }

        let all = series.iter().flat_map(|(_, samples)| samples.as_ref());
        let mut bounds: Option<(f64, f64)> = None;
        for &sample in all {
            if !sample.is_finite() {
                return Err(HistogramError::NonFinite);
            }
            bounds = Some(match bounds {
                None => (sample, sample),
                Some((lo, hi)) => (lo.min(sample), hi.max(sample)),
            });
        }
        let (mut lo, mut hi) = bounds.ok_or(HistogramError::NoSamples)?;
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bins as f64;
        let mut edges: Vec<f64> = (0..bins).map(|i| lo + width * i as f64).collect();
        edges.push(hi);

        let series = series
            .iter()
            .map(|(label, samples)| {
                let mut counts = vec![0; bins];
                for &sample in samples.as_ref() {
                    let index = (((sample - lo) / width) as usize).min(bins - 1);
                    counts[index] += 1;
                }
                HistogramSeries {
                    label: label.as_ref().to_string(),
                    counts,
                }
            })
            .collect();

        Ok(Self { edges, series })
    }

    /// Bin edges; one more than the number of bins.
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Number of bins.
    pub fn bins(&self) -> usize {
        self.edges.len() - 1
    }

    /// The binned series, in the order they were given.
    pub fn series(&self) -> &[HistogramSeries] {
        &self.series
    }

    /// Smallest and largest edge.
    pub fn range(&self) -> (f64, f64) {
        (self.edges[0], self.edges[self.edges.len() - 1])
    }

    /// Tallest bin across every series.
    pub fn max_count(&self) -> usize {
        self.series
            .iter()
            .flat_map(|s| s.counts.iter().copied())
            .max()
            .unwrap_or(0)
    }

    /// `(left edge, right edge, count)` for each bin of `series`.
    pub fn bars<'a>(
        &'a self,
        series: &'a HistogramSeries,
    ) -> impl Iterator<Item = (f64, f64, usize)> + 'a {
        self.edges
            .windows(2)
            .zip(series.counts.iter())
            .map(|(edge, &count)| (edge[0], edge[1], count))
    }
}
