use std::sync::{
    atomic::{AtomicIsize, Ordering},
    Mutex, PoisonError,
};

use crate::{AllocationGroupId, AllocationRegistry, AllocationTracker, SetTrackerError};

/// Number of allocation groups the ledger can hold counters for.
pub(crate) const LEDGER_SLOTS: usize = 256;

pub(crate) static LEDGER: GroupLedger = GroupLedger::new();

static INSTALLED: Mutex<bool> = Mutex::new(false);

/// Live byte counts, one slot per allocation group.
///
/// Every update is a single atomic operation on a preallocated slot, so the ledger can be driven
/// from inside the global allocator. Groups whose identifier does not fit in the table are
/// silently ignored.
pub(crate) struct GroupLedger {
    live: [AtomicIsize; LEDGER_SLOTS],
}

impl GroupLedger {
    const fn new() -> Self {
        #[allow(clippy::declare_interior_mutable_const)]
        const ZERO: AtomicIsize = AtomicIsize::new(0);
        Self {
            live: [ZERO; LEDGER_SLOTS],
        }
    }

    fn slot(&self, group: AllocationGroupId) -> Option<&AtomicIsize> {
        self.live.get(group.as_usize())
    }

    pub fn covers(&self, group: AllocationGroupId) -> bool {
        self.slot(group).is_some()
    }

    /// Bytes currently held by `group`.
    ///
    /// Frees of memory allocated before the group was entered can drive the raw counter below
    /// zero; those read as zero.
    pub fn live_bytes(&self, group: AllocationGroupId) -> usize {
        self.slot(group)
            .map(|live| live.load(Ordering::Acquire).max(0) as usize)
            .unwrap_or(0)
    }

    pub fn reset(&self, group: AllocationGroupId) {
        if let Some(live) = self.slot(group) {
            live.store(0, Ordering::Release);
        }
    }

    fn record_allocation(&self, group: AllocationGroupId, size: usize) {
        if let Some(live) = self.slot(group) {
            live.fetch_add(size as isize, Ordering::AcqRel);
        }
    }

    fn record_deallocation(&self, group: AllocationGroupId, size: usize) {
        if let Some(live) = self.slot(group) {
            live.fetch_sub(size as isize, Ordering::AcqRel);
        }
    }
}

struct LedgerTracker;

impl AllocationTracker for LedgerTracker {
    fn allocated(&self, _addr: usize, size: usize, group_id: AllocationGroupId) {
        LEDGER.record_allocation(group_id, size);
    }

    fn deallocated(&self, _addr: usize, size: usize, current_group_id: AllocationGroupId) {
        LEDGER.record_deallocation(current_group_id, size);
    }
}

/// Installs the ledger as the global tracker, unless it already is.
///
/// # Errors
/// Fails if some other tracker has been installed as the global tracker.
pub(crate) fn install() -> Result<(), SetTrackerError> {
    let mut installed = INSTALLED.lock().unwrap_or_else(PoisonError::into_inner);
    if !*installed {
        AllocationRegistry::set_global_tracker(LedgerTracker)?;
        *installed = true;
    }
    Ok(())
}
