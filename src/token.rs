use std::{
    cell::Cell,
    marker::PhantomData,
    sync::atomic::{AtomicUsize, Ordering},
};

use crate::util::PhantomNotSend;

static NEXT_GROUP_ID: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    /// The currently active allocation group.
    ///
    /// Any allocations which occur on this thread will be associated with whichever group is
    /// present at the time of the allocation.
    static CURRENT_ALLOCATION_GROUP: Cell<Option<AllocationGroupId>> = const { Cell::new(None) };
}

/// The identifier that uniquely identifies an allocation group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AllocationGroupId(usize);

impl AllocationGroupId {
    /// Gets the integer form of this allocation group identifier.
    pub fn as_usize(&self) -> usize {
        self.0
    }
}

/// A token that uniquely identifies an allocation group.
///
/// No allocations are tracked unless a group is active on the thread making the allocation.
/// Groups are made active by entering their token, which hands back an [`AllocationGuard`].
/// When the guard is dropped, or exited explicitly, the previously active group (if any) becomes
/// active again, so groups nest naturally.
///
/// Entering only needs a shared reference, which lets a footprint measurement enter its group
/// around each operation it observes.
#[derive(Debug)]
pub struct AllocationGroupToken(AllocationGroupId);

impl AllocationGroupToken {
    /// Registers a new allocation group.
    ///
    /// Group identifiers are handed out sequentially and never reused.
    pub fn register() -> AllocationGroupToken {
        let id = NEXT_GROUP_ID.fetch_add(1, Ordering::Relaxed);
        AllocationGroupToken(AllocationGroupId(id))
    }

    /// The ID associated with this allocation group.
    pub fn id(&self) -> AllocationGroupId {
        self.0
    }

    /// Marks the associated allocation group as the active allocation group on this thread.
    ///
    /// If another allocation group is currently active, it is replaced, and restored either when
    /// the returned guard is dropped, or when [`AllocationGuard::exit`] is called.
    pub fn enter(&self) -> AllocationGuard<'_> {
        AllocationGuard {
            previous: replace_current_group(Some(self.0)),
            _token: PhantomData,
            _ns: PhantomNotSend::default(),
        }
    }
}

/// Guard that updates the current thread to track allocations for the associated allocation group.
///
/// ## Moving across threads
///
/// [`AllocationGuard`] is specifically marked as `!Send` as the active allocation group is tracked
/// at a per-thread level.
///
/// ```compile_fail
/// use growth_probe::AllocationGuard;
/// trait AssertSend: Send {}
///
/// impl AssertSend for AllocationGuard<'_> {}
/// ```
pub struct AllocationGuard<'a> {
    previous: Option<AllocationGroupId>,
    _token: PhantomData<&'a AllocationGroupToken>,
    _ns: PhantomNotSend,
}

impl AllocationGuard<'_> {
    /// Unmarks this allocation group as the active allocation group on this thread, resetting the
    /// active allocation group to the previous value.
    pub fn exit(self) {
        drop(self)
    }
}

impl Drop for AllocationGuard<'_> {
    fn drop(&mut self) {
        replace_current_group(self.previous);
    }
}

/// Restores the suspended allocation group when dropped.
pub(crate) struct SuspendedGroup {
    previous: Option<AllocationGroupId>,
    _ns: PhantomNotSend,
}

impl Drop for SuspendedGroup {
    fn drop(&mut self) {
        replace_current_group(self.previous);
    }
}

pub(crate) fn suspend_current_group() -> SuspendedGroup {
    SuspendedGroup {
        previous: replace_current_group(None),
        _ns: PhantomNotSend::default(),
    }
}

fn replace_current_group(group: Option<AllocationGroupId>) -> Option<AllocationGroupId> {
    // During thread teardown the slot may already be gone, in which case nothing is tracked.
    CURRENT_ALLOCATION_GROUP
        .try_with(|current| current.replace(group))
        .ok()
        .flatten()
}

/// Gets the current allocation group, if one is active.
#[inline(always)]
pub(crate) fn get_active_allocation_group() -> Option<AllocationGroupId> {
    CURRENT_ALLOCATION_GROUP
        .try_with(Cell::get)
        .ok()
        .flatten()
}
