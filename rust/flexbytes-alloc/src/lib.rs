//! The reallocation seam used by the flexbytes buffer types.
//!
//! Every allocate, resize and release request in this workspace flows through
//! a single function-shaped interface, [`Reallocator::reallocate`]. Swapping
//! the memory provider (system allocator, budget-limited provider, auditing
//! wrapper) means swapping the implementation behind that one seam; no call
//! site changes.
//!
//! # Implementations
//!
//! - [`SystemReallocator`]: delegates to the global system allocator.
//! - [`BudgetReallocator`]: enforces a fixed byte budget on top of another
//!   reallocator, turning over-budget requests into `MemoryExhausted` errors.
//! - [`CountingReallocator`]: records allocation traffic for leak audits.

pub mod budget;
pub mod counter;
pub mod counting;
pub mod realloc;
pub mod system;


pub use budget::BudgetReallocator;
pub use counting::{AllocStats, CountingReallocator};
pub use realloc::{MIN_ALIGN, Reallocator};
pub use system::SystemReallocator;
