//! `Reallocator`: a trait for pluggable allocate/resize/release providers.

use std::ptr::NonNull;

use flexbytes_common::Result;

/// Minimal alignment, in bytes, of every block handed out by a
/// [`Reallocator`].
///
/// Callers may rely on this when placing headers or typed data at the start
/// of a block.
pub const MIN_ALIGN: usize = 16;

/// A pluggable allocate/resize/release strategy.
///
/// All three request shapes funnel through [`reallocate`](Self::reallocate),
/// dispatched on the `(ptr, new_size)` pair:
///
/// | `ptr`    | `new_size` | meaning                          |
/// |----------|------------|----------------------------------|
/// | `None`   | any        | fresh allocation of `new_size`   |
/// | `Some`   | `> 0`      | resize the block to `new_size`   |
/// | `Some`   | `0`        | release the block                |
///
/// Release requires a block; a fresh request of zero bytes is still a fresh
/// request, and providers clamp it so that every successful allocation
/// returns a live, releasable block.
///
/// Exhaustion is reported as `ErrorKind::MemoryExhausted`; it is never a
/// process abort, and a failed request leaves the original block (if any)
/// untouched and still owned by the caller.
///
/// # Sizing contract
///
/// `old_size` must equal the size passed in the most recent successful
/// allocate or resize request for the block. Implementations are allowed to
/// require the exact value (the system allocator does, to reconstruct the
/// block layout); none may be handed a smaller "partial" size.
///
/// # Safety
///
/// Implementors must guarantee that:
/// - Successful fresh and resize requests return a live block of at least
///   `new_size` bytes, aligned to at least [`MIN_ALIGN`], valid until
///   released or resized through this same reallocator.
/// - Resize preserves the block contents up to `min(old_size, new_size)`
///   bytes, even when the block relocates.
/// - Release requests (`ptr` present, `new_size == 0`) always succeed and
///   return `Ok(None)`.
pub unsafe trait Reallocator {
    /// Performs one allocate, resize or release request.
    ///
    /// # Safety
    ///
    /// If `ptr` is `Some`, it must have been returned by a previous request
    /// to this same reallocator, not yet released, and `old_size` must match
    /// the sizing contract above. After a release or a successful resize the
    /// old pointer is invalid.
    unsafe fn reallocate(
        &self,
        ptr: Option<NonNull<u8>>,
        old_size: usize,
        new_size: usize,
    ) -> Result<Option<NonNull<u8>>>;

    /// Requests a fresh block of `size` bytes.
    ///
    /// Equivalent to `reallocate(None, 0, size)`. A zero `size` still
    /// yields a live block.
    fn allocate(&self, size: usize) -> Result<NonNull<u8>> {
        // A fresh request references no existing block.
        let block = unsafe { self.reallocate(None, 0, size)? };
        Ok(block.expect("fresh allocation returned no block"))
    }

    /// Releases a block previously obtained from this reallocator.
    ///
    /// Equivalent to `reallocate(Some(ptr), size, 0)`.
    ///
    /// # Safety
    ///
    /// Same requirements as [`reallocate`](Self::reallocate): `ptr` came
    /// from this reallocator, `size` matches its most recent request size,
    /// and the block is not referenced again.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize) {
        let released = unsafe { self.reallocate(Some(ptr), size, 0) };
        debug_assert!(matches!(released, Ok(None)));
    }
}
