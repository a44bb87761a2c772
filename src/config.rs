use std::{error, fmt, path::PathBuf};

use crate::{
    CapacityLayout, Container, ProbeConfig, ThresholdPolicy, DEFAULT_TRIALS, DEFAULT_UPPER_BOUND,
};

/// Default number of histogram bins.
pub const DEFAULT_BINS: usize = 30;

/// Where footprints come from.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FootprintSource {
    /// Bytes observed by the tracking allocator.
    #[default]
    Allocator,
    /// The container's own capacity.
    Reported,
}

/// Settings for a full measurement run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Element counts `0..upper_bound` are probed for capacity transitions.
    pub upper_bound: usize,
    /// Trials per timing sample set.
    pub trials: usize,
    /// Histogram bins.
    pub bins: usize,
    /// Which capacity transition becomes the threshold.
    pub policy: ThresholdPolicy,
    /// Fixed header size override, in bytes.
    pub overhead: Option<usize>,
    /// Per-element size override, in bytes.
    pub element_size: Option<usize>,
    /// Where footprints come from.
    pub footprint: FootprintSource,
    /// Image file to render into; `None` prints a text histogram instead.
    pub output: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upper_bound: DEFAULT_UPPER_BOUND,
            trials: DEFAULT_TRIALS,
            bins: DEFAULT_BINS,
            policy: ThresholdPolicy::default(),
            overhead: None,
            element_size: None,
            footprint: FootprintSource::default(),
            output: None,
        }
    }
}

impl Config {
    /// Checks that every setting is usable.
    ///
    /// # Errors
    /// The first offending setting, as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upper_bound == 0 {
            return Err(ConfigError::Zero("upper bound"));
        }
        if self.trials == 0 {
            return Err(ConfigError::Zero("trial count"));
        }
        if self.bins == 0 {
            return Err(ConfigError::Zero("bin count"));
        }
        if self.element_size == Some(0) {
            return Err(ConfigError::Zero("element size"));
        }
        Ok(())
    }

    /// Capacity layout for `C`, with any overrides applied.
    pub fn layout<C: Container>(&self) -> CapacityLayout {
        let native = CapacityLayout::of::<C>();
        CapacityLayout::new(
            self.overhead.unwrap_or(native.overhead),
            self.element_size.unwrap_or(native.element_size),
        )
    }

    /// Probe parameters for `C`.
    pub fn probe_config<C: Container>(&self) -> ProbeConfig {
        ProbeConfig::for_container::<C>()
            .with_upper_bound(self.upper_bound)
            .with_layout(self.layout::<C>())
            .with_policy(self.policy)
    }
}

/// Returned when a [`Config`] is unusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A setting that must be positive is zero.
    Zero(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Zero(setting) => write!(f, "{} must be greater than zero", setting),
        }
    }
}

impl error::Error for ConfigError {}
