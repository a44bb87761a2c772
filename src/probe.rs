//! Capacity threshold detection.
use std::{error, fmt};

use tracing::{debug, info, warn};

use crate::{CapacityLayout, Container, Footprint, LayoutError};

/// Default number of element counts scanned by [`probe_capacity`].
pub const DEFAULT_UPPER_BOUND: usize = 64;

/// Which capacity transition in the scanned range becomes the threshold.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdPolicy {
    /// The first transition after the initial allocation.
    First,
    /// The last transition observed in the range.
    #[default]
    Last,
}

impl fmt::Display for ThresholdPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdPolicy::First => f.pad("first"),
            ThresholdPolicy::Last => f.pad("last"),
        }
    }
}

/// Parameters of a capacity probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Element counts `0..upper_bound` are scanned.
    pub upper_bound: usize,
    /// Turns footprints into capacities.
    pub layout: CapacityLayout,
    /// Which transition becomes the threshold.
    pub policy: ThresholdPolicy,
}

impl ProbeConfig {
    /// Default probe parameters for container type `C`.
    pub fn for_container<C: Container>() -> Self {
        Self {
            upper_bound: DEFAULT_UPPER_BOUND,
            layout: CapacityLayout::of::<C>(),
            policy: ThresholdPolicy::default(),
        }
    }

    /// Sets the number of element counts to scan.
    pub fn with_upper_bound(mut self, upper_bound: usize) -> Self {
        self.upper_bound = upper_bound;
        self
    }

    /// Overrides the footprint layout constants.
    pub fn with_layout(mut self, layout: CapacityLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Sets the threshold policy.
    pub fn with_policy(mut self, policy: ThresholdPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// A capacity observed right after an append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacitySample {
    /// Length of the container before the append that produced this capacity.
    pub element_count: usize,
    /// Capacity derived from the footprint after the append.
    pub capacity: usize,
}

/// Outcome of a capacity probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    threshold: usize,
    policy: ThresholdPolicy,
    upper_bound: usize,
    layout: CapacityLayout,
    transitions: Vec<CapacitySample>,
}

impl ProbeReport {
    /// The threshold `S`: appending onto a container of `S` elements reallocates.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// The policy the threshold was selected with.
    pub fn policy(&self) -> ThresholdPolicy {
        self.policy
    }

    /// Number of element counts that were scanned.
    pub fn upper_bound(&self) -> usize {
        self.upper_bound
    }

    /// The layout used to derive capacities.
    pub fn layout(&self) -> CapacityLayout {
        self.layout
    }

    /// Every capacity transition observed, in scan order.
    pub fn transitions(&self) -> &[CapacitySample] {
        &self.transitions
    }

    /// Ratios between successive non-zero capacities.
    pub fn growth_factors(&self) -> Vec<f64> {
        self.transitions
            .windows(2)
            .filter(|pair| pair[0].capacity > 0)
            .map(|pair| pair[1].capacity as f64 / pair[0].capacity as f64)
            .collect()
    }
}

/// Errors raised while probing capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The layout cannot derive capacities.
    Layout(LayoutError),
    /// The scanned range is empty.
    EmptyRange,
    /// No usable capacity transition happened within the scanned range.
    NoTransition {
        /// Number of element counts that were scanned.
        upper_bound: usize,
    },
    /// The footprint is smaller than the layout's fixed overhead.
    InconsistentFootprint {
        /// Length of the container before the offending append.
        element_count: usize,
        /// Footprint reported after the append.
        footprint: usize,
        /// Overhead the layout expected.
        overhead: usize,
    },
    /// Capacity went down while elements were being appended.
    CapacityDecreased {
        /// Length of the container before the offending append.
        element_count: usize,
        /// Capacity before the append.
        previous: usize,
        /// Capacity after the append.
        current: usize,
    },
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Layout(e) => write!(f, "invalid capacity layout: {}", e),
            ProbeError::EmptyRange => f.pad("probe range must contain at least one element count"),
            ProbeError::NoTransition { upper_bound } => write!(
                f,
                "no capacity change after the first append within {} elements",
                upper_bound
            ),
            ProbeError::InconsistentFootprint {
                element_count,
                footprint,
                overhead,
            } => write!(
                f,
                "footprint of {} bytes at {} elements is below the assumed overhead of {} bytes",
                footprint, element_count, overhead
            ),
            ProbeError::CapacityDecreased {
                element_count,
                previous,
                current,
            } => write!(
                f,
                "capacity dropped from {} to {} while appending onto {} elements",
                previous, current, element_count
            ),
        }
    }
}

impl error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ProbeError::Layout(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LayoutError> for ProbeError {
    fn from(e: LayoutError) -> Self {
        ProbeError::Layout(e)
    }
}

/// Finds the element count at which the container's capacity changes.
///
/// A scratch container is grown one element at a time for `config.upper_bound` appends. After
/// each append the footprint is converted into a capacity; whenever it differs from the previous
/// one, the element count before the append is recorded as a transition. The threshold is then
/// chosen from the recorded transitions according to `config.policy`.
///
/// The transition caused by the very first append (element count 0) is recorded but never chosen,
/// as there is no smaller container to compare against.
///
/// # Errors
/// See [`ProbeError`].
pub fn probe_capacity<C, F>(config: &ProbeConfig, footprint: &F) -> Result<ProbeReport, ProbeError>
where
    C: Container,
    F: Footprint<C>,
{
    config.layout.validate()?;
    if config.upper_bound == 0 {
        return Err(ProbeError::EmptyRange);
    }

    let mut container = footprint.track(C::empty);
    let scanned = scan(config, footprint, &mut container);
    footprint.track(move || drop(container));
    let transitions = scanned?;

    let mut eligible = transitions.iter().filter(|t| t.element_count > 0);
    let chosen = match config.policy {
        ThresholdPolicy::First => eligible.next(),
        ThresholdPolicy::Last => eligible.last(),
    };
    let threshold = chosen
        .map(|t| t.element_count)
        .ok_or(ProbeError::NoTransition {
            upper_bound: config.upper_bound,
        })?;

    let later = transitions
        .iter()
        .filter(|t| t.element_count > threshold)
        .count();
    if config.policy == ThresholdPolicy::First && later > 0 {
        warn!(
            threshold,
            later, "later capacity transitions in range were not selected"
        );
    }
    info!(
        threshold,
        policy = %config.policy,
        transitions = transitions.len(),
        "capacity threshold found"
    );

    Ok(ProbeReport {
        threshold,
        policy: config.policy,
        upper_bound: config.upper_bound,
        layout: config.layout,
        transitions,
    })
}

fn scan<C, F>(
    config: &ProbeConfig,
    footprint: &F,
    container: &mut C,
) -> Result<Vec<CapacitySample>, ProbeError>
where
    C: Container,
    F: Footprint<C>,
{
    let mut transitions = Vec::new();
    let mut last_capacity = 0;

    for element_count in 0..config.upper_bound {
        footprint.track(|| container.grow_by_one());

        let bytes = footprint.footprint(container);
        let capacity =
            config
                .layout
                .capacity(bytes)
                .ok_or(ProbeError::InconsistentFootprint {
                    element_count,
                    footprint: bytes,
                    overhead: config.layout.overhead,
                })?;

        if capacity < last_capacity {
            return Err(ProbeError::CapacityDecreased {
                element_count,
                previous: last_capacity,
                current: capacity,
            });
        }
        if capacity != last_capacity {
            debug!(element_count, capacity, previous = last_capacity, "capacity transition");
            transitions.push(CapacitySample {
                element_count,
                capacity,
            });
            last_capacity = capacity;
        }
    }

    Ok(transitions)
}
