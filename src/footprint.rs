use std::{
    error, fmt,
    hint::black_box,
    mem::{size_of, size_of_val},
};

use crate::ledger::{self, LEDGER};
use crate::{AllocationGroupToken, AllocationRegistry, Container};

// Size of the allocation used to check that the tracking allocator is actually installed.
const CALIBRATION_BYTES: usize = 64;

/// Reports the memory footprint of a container.
///
/// The footprint is the total number of bytes held by the container, including its fixed header.
/// Any `Fn(&C) -> usize` closure is a footprint, which makes it straightforward to substitute a
/// synthetic one.
pub trait Footprint<C: ?Sized> {
    /// Gets the current footprint of `container`, in bytes.
    fn footprint(&self, container: &C) -> usize;

    /// Runs an operation on the container in whatever scope this footprint needs in order to
    /// observe it.
    ///
    /// Every operation that may change the container's footprint must run through this.
    fn track<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R,
    {
        op()
    }
}

impl<C: ?Sized, F> Footprint<C> for F
where
    F: Fn(&C) -> usize,
{
    fn footprint(&self, container: &C) -> usize {
        self(container)
    }
}

/// Returned when a [`CapacityLayout`] cannot be used to derive a capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
    /// The per-element size is zero.
    ZeroElementSize,
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::ZeroElementSize => f.pad("per-element size must be non-zero"),
        }
    }
}

impl error::Error for LayoutError {}

/// The constants that turn a footprint into a capacity.
///
/// `capacity = (footprint - overhead) / element_size`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityLayout {
    /// Fixed bytes every container carries regardless of its capacity.
    pub overhead: usize,
    /// Bytes occupied by each element slot.
    pub element_size: usize,
}

impl CapacityLayout {
    /// Creates a layout from explicit constants.
    pub const fn new(overhead: usize, element_size: usize) -> Self {
        Self {
            overhead,
            element_size,
        }
    }

    /// The layout of `C` as laid out by this compiler: its own size as overhead, and the size of
    /// its element type per slot.
    pub fn of<C: Container>() -> Self {
        Self::new(size_of::<C>(), size_of::<C::Element>())
    }

    /// Checks that capacities can be derived with this layout.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.element_size == 0 {
            return Err(LayoutError::ZeroElementSize);
        }
        Ok(())
    }

    /// Derives a capacity from `footprint`.
    ///
    /// Returns `None` when the footprint is smaller than the overhead or the element size is zero.
    pub fn capacity(&self, footprint: usize) -> Option<usize> {
        footprint
            .checked_sub(self.overhead)
            .and_then(|bytes| bytes.checked_div(self.element_size))
    }
}

/// Footprint computed from the container's own capacity.
///
/// This is what a container reports about itself: its header plus one element slot per unit of
/// capacity. It needs no allocator support.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReportedFootprint;

impl<C: Container> Footprint<C> for ReportedFootprint {
    fn footprint(&self, container: &C) -> usize {
        size_of_val(container) + container.capacity() * size_of::<C::Element>()
    }
}

/// Returned when an [`AllocatorFootprint`] cannot be set up.
#[derive(Debug)]
pub enum FootprintError {
    /// Another global tracker was installed before the footprint ledger.
    TrackerConflict,
    /// The ledger has no counter slot left for a new allocation group.
    LedgerFull {
        /// The allocation group that did not fit.
        group: usize,
    },
    /// A calibration allocation made inside the group was not observed, which means
    /// [`Allocator`][crate::Allocator] is not the global allocator.
    AllocatorNotInstalled,
}

impl fmt::Display for FootprintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FootprintError::TrackerConflict => {
                f.pad("a different global allocation tracker is already installed")
            }
            FootprintError::LedgerFull { group } => write!(
                f,
                "allocation group {} exceeds the {} groups the footprint ledger can hold",
                group,
                ledger::LEDGER_SLOTS
            ),
            FootprintError::AllocatorNotInstalled => {
                f.pad("allocations are not observed; growth_probe::Allocator is not global")
            }
        }
    }
}

impl error::Error for FootprintError {}

/// Footprint measured through the tracking allocator.
///
/// Each `AllocatorFootprint` owns an allocation group. Operations passed to
/// [`Footprint::track`] run with that group active, and the bytes they leave allocated are what
/// the footprint reports, on top of the container's header.
///
/// Registering enables allocation tracking process-wide; it stays enabled afterwards.
#[derive(Debug)]
pub struct AllocatorFootprint {
    token: AllocationGroupToken,
}

impl AllocatorFootprint {
    /// Registers a new footprint group and checks that allocations are being observed.
    ///
    /// # Errors
    /// See [`FootprintError`].
    pub fn register() -> Result<Self, FootprintError> {
        ledger::install().map_err(|_| FootprintError::TrackerConflict)?;
        AllocationRegistry::enable_tracking();

        let token = AllocationGroupToken::register();
        if !LEDGER.covers(token.id()) {
            return Err(FootprintError::LedgerFull {
                group: token.id().as_usize(),
            });
        }
        LEDGER.reset(token.id());

        let footprint = Self { token };
        footprint.calibrate()?;
        Ok(footprint)
    }

    fn calibrate(&self) -> Result<(), FootprintError> {
        let probe = self.track(|| black_box(Box::new([0u8; CALIBRATION_BYTES])));
        let observed = self.live_bytes();
        self.track(move || drop(probe));

        if observed < CALIBRATION_BYTES {
            return Err(FootprintError::AllocatorNotInstalled);
        }
        Ok(())
    }

    /// Bytes currently held by allocations made inside this footprint's group.
    pub fn live_bytes(&self) -> usize {
        LEDGER.live_bytes(self.token.id())
    }

    /// Runs `op` with this footprint's allocation group active on the current thread.
    pub fn track<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = self.token.enter();
        op()
    }
}

impl<C> Footprint<C> for AllocatorFootprint {
    fn footprint(&self, container: &C) -> usize {
        size_of_val(container) + self.live_bytes()
    }

    fn track<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R,
    {
        AllocatorFootprint::track(self, op)
    }
}
