//! # growth-probe
//!
//! This crate measures the amortized growth behavior of a dynamic array. It finds the element
//! count at which a container's backing storage has to be reallocated, times single appends on
//! either side of that boundary, and renders the two latency distributions as overlaid
//! histograms.
//!
//! ## high-level usage
//!
//! `growth-probe` runs a fixed three-phase pipeline:
//! - [`probe_capacity`] grows a [`Container`] one element at a time and watches its
//!   [`Footprint`] to find the threshold `S` where capacity last changed
//! - [`measure_threshold`] times one append onto fresh containers of size `S` and `S - 1`
//! - a [`Renderer`] draws both sample sets, either to an image file ([`PlotRenderer`]) or as text
//!   ([`TextRenderer`])
//!
//! [`run`] ties the phases together.
//!
//! ## measuring footprints
//!
//! Footprints are an injected strategy. [`ReportedFootprint`] trusts the container's own notion
//! of capacity, while [`AllocatorFootprint`] observes the bytes actually handed out by the
//! global allocator. The latter only works when [`Allocator`] is installed via
//! `#[global_allocator]`:
//!
//! ```ignore
//! use std::alloc::System;
//! use growth_probe::Allocator;
//!
//! #[global_allocator]
//! static GLOBAL: Allocator<System> = Allocator::system();
//! ```
//!
//! Allocations are attributed to allocation groups ([`AllocationGroupToken`]), which are entered
//! per thread, so only the allocations made on behalf of the container under test are counted.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![warn(clippy::all)]
use std::{
    error, fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        OnceLock,
    },
};

mod allocator;
mod config;
mod container;
mod footprint;
mod histogram;
mod ledger;
mod pipeline;
mod probe;
mod render;
mod timing;
mod token;
mod util;

pub use crate::allocator::Allocator;
pub use crate::config::{Config, ConfigError, FootprintSource, DEFAULT_BINS};
pub use crate::container::Container;
pub use crate::footprint::{
    AllocatorFootprint, CapacityLayout, Footprint, FootprintError, LayoutError, ReportedFootprint,
};
pub use crate::histogram::{Histogram, HistogramError, HistogramSeries};
pub use crate::pipeline::{run, PipelineError, Report};
pub use crate::probe::{
    probe_capacity, CapacitySample, ProbeConfig, ProbeError, ProbeReport, ThresholdPolicy,
    DEFAULT_UPPER_BOUND,
};
pub use crate::render::{Chart, ImageFormat, PlotRenderer, RenderError, Renderer, TextRenderer};
pub use crate::timing::{
    measure_append, measure_threshold, repeat, Summary, ThresholdTimings, TimingError,
    TimingSamples, DEFAULT_TRIALS,
};
pub use crate::token::{AllocationGroupId, AllocationGroupToken, AllocationGuard};

/// Whether or not allocations should be tracked.
static TRACKING_ENABLED: AtomicBool = AtomicBool::new(false);

// The global tracker.  This is consulted for every allocation made while tracking is enabled and
// an allocation group is active on the allocating thread.
static GLOBAL_TRACKER: OnceLock<Tracker> = OnceLock::new();

/// Tracks allocations and deallocations.
///
/// Implementations are called from inside the global allocator with no allocation group active,
/// so any allocations they make themselves are not tracked.
pub trait AllocationTracker {
    /// Tracks when an allocation has occurred.
    fn allocated(&self, addr: usize, size: usize, group_id: AllocationGroupId);

    /// Tracks when a deallocation has occurred.
    ///
    /// Deallocations are attributed to the allocation group active at the time of the
    /// deallocation, not the group the memory was originally allocated under.
    fn deallocated(&self, addr: usize, size: usize, current_group_id: AllocationGroupId);
}

struct Tracker {
    tracker: Box<dyn AllocationTracker + Send + Sync + 'static>,
}

impl Tracker {
    fn from_allocation_tracker<T>(allocation_tracker: T) -> Self
    where
        T: AllocationTracker + Send + Sync + 'static,
    {
        Self {
            tracker: Box::new(allocation_tracker),
        }
    }

    fn allocated(&self, addr: usize, size: usize, group_id: AllocationGroupId) {
        self.tracker.allocated(addr, size, group_id)
    }

    fn deallocated(&self, addr: usize, size: usize, current_group_id: AllocationGroupId) {
        self.tracker.deallocated(addr, size, current_group_id)
    }
}

/// Returned if trying to set the global tracker fails.
#[derive(Debug)]
pub struct SetTrackerError {
    _sealed: (),
}

impl fmt::Display for SetTrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad("a global tracker has already been set")
    }
}

impl error::Error for SetTrackerError {}

/// Handles the global tracker and whether tracking is enabled.
pub struct AllocationRegistry;

impl AllocationRegistry {
    /// Enables the tracking of allocations.
    pub fn enable_tracking() {
        TRACKING_ENABLED.store(true, Ordering::SeqCst);
    }

    /// Disables the tracking of allocations.
    pub fn disable_tracking() {
        TRACKING_ENABLED.store(false, Ordering::SeqCst);
    }

    /// Whether or not allocations are currently being tracked.
    pub fn is_tracking_enabled() -> bool {
        TRACKING_ENABLED.load(Ordering::SeqCst)
    }

    /// Sets the global tracker.
    ///
    /// Setting a global tracker does not enable or disable the tracking of allocations, so callers
    /// still need to call `enable_tracking` after this in order to fully enable tracking.
    ///
    /// # Errors
    /// `Err(SetTrackerError)` is returned if a global tracker has already been set, otherwise
    /// `Ok(())`.
    pub fn set_global_tracker<T>(tracker: T) -> Result<(), SetTrackerError>
    where
        T: AllocationTracker + Send + Sync + 'static,
    {
        GLOBAL_TRACKER
            .set(Tracker::from_allocation_tracker(tracker))
            .map_err(|_| SetTrackerError { _sealed: () })
    }

    /// Runs `f` with no allocation group active on the current thread.
    ///
    /// Whatever group was active beforehand is restored once `f` returns.
    pub fn untracked<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = token::suspend_current_group();
        f()
    }
}

#[inline(always)]
fn get_global_tracker() -> Option<&'static Tracker> {
    // If tracking isn't enabled, then there's no point returning the tracker.
    if !TRACKING_ENABLED.load(Ordering::Relaxed) {
        return None;
    }

    GLOBAL_TRACKER.get()
}
