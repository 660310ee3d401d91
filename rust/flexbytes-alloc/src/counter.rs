use std::sync::atomic::{AtomicU64, Ordering};

/// A thread-safe counter that enables multiple consumers to withdraw (if
/// possible) and deposit specific amounts, ensuring that the counter value
/// remains non-negative.
pub struct Counter(AtomicU64);

impl Counter {
    /// Creates a new `Counter` with the given initial amount.
    pub fn new(amount: u64) -> Counter {
        Counter(AtomicU64::new(amount))
    }

    /// Attempts to withdraw the specified `amount` from the counter.
    ///
    /// If the current value of the counter is greater than or equal to
    /// `amount`, the amount is subtracted and `true` is returned. Otherwise
    /// the counter is unchanged and `false` is returned.
    ///
    /// Uses an atomic read-modify-write loop to remain correct when
    /// multiple threads withdraw concurrently.
    pub fn withdraw(&self, amount: u64) -> bool {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Relaxed, |current| {
                current.checked_sub(amount)
            })
            .is_ok()
    }

    /// Deposits the specified `amount` into the counter.
    pub fn deposit(&self, amount: u64) {
        self.0.fetch_add(amount, Ordering::Release);
    }

    /// Returns the counter value (most likely stale by the time it is
    /// observed by the caller).
    pub fn read(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }
}
