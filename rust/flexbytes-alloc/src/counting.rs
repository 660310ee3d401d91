//! Allocation-traffic accounting for leak audits.

use std::ptr::NonNull;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use flexbytes_common::Result;

use crate::realloc::Reallocator;
use crate::system::SystemReallocator;

/// A [`Reallocator`] decorator that records the traffic passing through the
/// seam: request counts, byte totals, and the number of currently live
/// blocks and bytes.
///
/// Cloning shares the underlying counters, so a test can keep one handle
/// while handing another to the code under audit, then assert that every
/// allocation was balanced by a release ([`AllocStats::live_blocks`] and
/// [`AllocStats::live_bytes`] both zero).
///
/// Only successful requests are recorded; a failed request changes nothing.
#[derive(Clone, Default)]
pub struct CountingReallocator<R: Reallocator = SystemReallocator> {
    inner: R,
    cells: Arc<StatsCells>,
}

#[derive(Default)]
struct StatsCells {
    allocations: AtomicU64,
    resizes: AtomicU64,
    releases: AtomicU64,
    allocated_bytes: AtomicU64,
    freed_bytes: AtomicU64,
}

/// A point-in-time snapshot of a [`CountingReallocator`]'s counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocStats {
    /// Number of fresh-allocation requests served.
    pub allocations: u64,
    /// Number of resize requests served.
    pub resizes: u64,
    /// Number of release requests served (with a block to release).
    pub releases: u64,
    /// Total bytes handed out, across allocations and growing resizes.
    pub allocated_bytes: u64,
    /// Total bytes returned, across releases and shrinking resizes.
    pub freed_bytes: u64,
}

impl AllocStats {
    /// Number of blocks currently live.
    pub fn live_blocks(&self) -> u64 {
        self.allocations - self.releases
    }

    /// Number of bytes currently live.
    pub fn live_bytes(&self) -> u64 {
        self.allocated_bytes - self.freed_bytes
    }
}

impl CountingReallocator<SystemReallocator> {
    /// Creates a counting wrapper over the system allocator.
    pub fn system() -> CountingReallocator<SystemReallocator> {
        CountingReallocator::new(SystemReallocator)
    }
}

impl<R: Reallocator> CountingReallocator<R> {
    /// Creates a counting wrapper over `inner`.
    pub fn new(inner: R) -> CountingReallocator<R> {
        CountingReallocator {
            inner,
            cells: Arc::new(StatsCells::default()),
        }
    }

    /// Takes a snapshot of the counters.
    pub fn stats(&self) -> AllocStats {
        AllocStats {
            allocations: self.cells.allocations.load(Ordering::Acquire),
            resizes: self.cells.resizes.load(Ordering::Acquire),
            releases: self.cells.releases.load(Ordering::Acquire),
            allocated_bytes: self.cells.allocated_bytes.load(Ordering::Acquire),
            freed_bytes: self.cells.freed_bytes.load(Ordering::Acquire),
        }
    }
}

unsafe impl<R: Reallocator> Reallocator for CountingReallocator<R> {
    unsafe fn reallocate(
        &self,
        ptr: Option<NonNull<u8>>,
        old_size: usize,
        new_size: usize,
    ) -> Result<Option<NonNull<u8>>> {
        let block = unsafe { self.inner.reallocate(ptr, old_size, new_size)? };
        let cells = self.cells.as_ref();
        if ptr.is_none() {
            cells.allocations.fetch_add(1, Ordering::AcqRel);
            cells
                .allocated_bytes
                .fetch_add(new_size as u64, Ordering::AcqRel);
        } else if new_size == 0 {
            cells.releases.fetch_add(1, Ordering::AcqRel);
            cells.freed_bytes.fetch_add(old_size as u64, Ordering::AcqRel);
        } else {
            cells.resizes.fetch_add(1, Ordering::AcqRel);
            if new_size > old_size {
                cells
                    .allocated_bytes
                    .fetch_add((new_size - old_size) as u64, Ordering::AcqRel);
            } else {
                cells
                    .freed_bytes
                    .fetch_add((old_size - new_size) as u64, Ordering::AcqRel);
            }
        }
        Ok(block)
    }
}
