use std::alloc::{GlobalAlloc, Layout, System};

use crate::token::get_active_allocation_group;
use crate::{get_global_tracker, AllocationRegistry};

/// Tracking allocator implementation.
///
/// This allocator must be installed via `#[global_allocator]` in order to take effect.  It wraps
/// another allocator, [`System`] by default, and reports every allocation, deallocation and
/// reallocation made while an allocation group is active to the global
/// [`AllocationTracker`][crate::AllocationTracker].
pub struct Allocator<A = System> {
    inner: A,
}

impl Allocator<System> {
    /// Creates a tracking allocator that wraps the system allocator.
    pub const fn system() -> Allocator<System> {
        Self { inner: System }
    }
}

impl<A: GlobalAlloc> Allocator<A> {
    /// Creates a tracking allocator that wraps `inner`.
    pub const fn from_allocator(inner: A) -> Self {
        Self { inner }
    }
}

unsafe impl<A: GlobalAlloc> GlobalAlloc for Allocator<A> {
    #[track_caller]
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = self.inner.alloc(layout);
        if !ptr.is_null() {
            track_allocation(ptr as usize, layout.size());
        }
        ptr
    }

    #[track_caller]
    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = self.inner.alloc_zeroed(layout);
        if !ptr.is_null() {
            track_allocation(ptr as usize, layout.size());
        }
        ptr
    }

    #[track_caller]
    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        let addr = ptr as usize;
        self.inner.dealloc(ptr, layout);
        track_deallocation(addr, layout.size());
    }

    #[track_caller]
    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let old_addr = ptr as usize;
        let new_ptr = self.inner.realloc(ptr, layout, new_size);
        // On failure the original block is untouched, so there is nothing to report.
        if !new_ptr.is_null() {
            track_deallocation(old_addr, layout.size());
            track_allocation(new_ptr as usize, new_size);
        }
        new_ptr
    }
}

fn track_allocation(addr: usize, size: usize) {
    if let Some(tracker) = get_global_tracker() {
        if let Some(group) = get_active_allocation_group() {
            // Anything the tracker allocates must not be tracked, or we'd recurse forever.
            AllocationRegistry::untracked(|| tracker.allocated(addr, size, group))
        }
    }
}

fn track_deallocation(addr: usize, size: usize) {
    if let Some(tracker) = get_global_tracker() {
        if let Some(group) = get_active_allocation_group() {
            AllocationRegistry::untracked(|| tracker.deallocated(addr, size, group))
        }
    }
}
