//! Byte-budget enforcement on top of another reallocator.

use std::ptr::NonNull;
use std::sync::Arc;

use flexbytes_common::{Error, Result};

use crate::counter::Counter;
use crate::realloc::Reallocator;
use crate::system::SystemReallocator;

/// A [`Reallocator`] decorator that caps the total number of live bytes
/// obtained through it.
///
/// A request that would push the live total past the budget fails with
/// `MemoryExhausted` before the inner reallocator is touched; releases and
/// shrinking resizes return their bytes to the budget. Cloning shares the
/// budget, so several consumers can draw from one pool.
///
/// Primarily useful for exercising the out-of-memory path deterministically
/// and for sandboxing memory consumption of a subsystem.
#[derive(Clone)]
pub struct BudgetReallocator<R: Reallocator = SystemReallocator> {
    inner: R,
    remaining: Arc<Counter>,
}

impl BudgetReallocator<SystemReallocator> {
    /// Creates a budget of `budget` bytes over the system allocator.
    pub fn with_budget(budget: u64) -> BudgetReallocator<SystemReallocator> {
        BudgetReallocator::new(SystemReallocator, budget)
    }
}

impl<R: Reallocator> BudgetReallocator<R> {
    /// Creates a budget of `budget` bytes over `inner`.
    pub fn new(inner: R, budget: u64) -> BudgetReallocator<R> {
        BudgetReallocator {
            inner,
            remaining: Arc::new(Counter::new(budget)),
        }
    }

    /// Returns the remaining budget in bytes.
    ///
    /// **Note**: primarily for diagnostics; the value may be outdated by the
    /// time it is observed in a concurrent environment.
    pub fn remaining(&self) -> u64 {
        self.remaining.read()
    }
}

unsafe impl<R: Reallocator> Reallocator for BudgetReallocator<R> {
    unsafe fn reallocate(
        &self,
        ptr: Option<NonNull<u8>>,
        old_size: usize,
        new_size: usize,
    ) -> Result<Option<NonNull<u8>>> {
        if ptr.is_some() && new_size == 0 {
            let released = unsafe { self.inner.reallocate(ptr, old_size, 0)? };
            self.remaining.deposit(old_size as u64);
            return Ok(released);
        }
        if new_size > old_size {
            let growth = (new_size - old_size) as u64;
            if !self.remaining.withdraw(growth) {
                log::debug!(
                    "budget exhausted: requested {new_size} bytes, remaining {}",
                    self.remaining.read()
                );
                return Err(Error::memory_exhausted(new_size));
            }
            match unsafe { self.inner.reallocate(ptr, old_size, new_size) } {
                Ok(block) => Ok(block),
                Err(err) => {
                    // The inner provider declined; refund the reservation.
                    self.remaining.deposit(growth);
                    Err(err)
                }
            }
        } else {
            let block = unsafe { self.inner.reallocate(ptr, old_size, new_size)? };
            self.remaining.deposit((old_size - new_size) as u64);
            Ok(block)
        }
    }
}
