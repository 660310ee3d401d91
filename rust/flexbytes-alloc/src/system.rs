//! System-allocator backed implementation of the reallocation seam.

use std::alloc::{Layout, alloc, dealloc, realloc};
use std::ptr::NonNull;

use flexbytes_common::{Error, Result};

use crate::realloc::{MIN_ALIGN, Reallocator};

/// A [`Reallocator`] that delegates every request to the global system
/// allocator.
///
/// Zero-size allocation requests are clamped to one byte so that every
/// successful request returns a live block; the clamp is applied consistently
/// on both sides, so release and resize requests reconstruct the same layout
/// the block was allocated with.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemReallocator;

/// Builds the layout for a block of `size` bytes.
///
/// Fails with `MemoryExhausted` when the rounded-up size is not
/// representable, which is the same "cannot satisfy this request" outcome
/// the allocator itself would report.
fn block_layout(size: usize) -> Result<Layout> {
    Layout::from_size_align(size.max(1), MIN_ALIGN)
        .map_err(|_| Error::memory_exhausted(size))
}

unsafe impl Reallocator for SystemReallocator {
    unsafe fn reallocate(
        &self,
        ptr: Option<NonNull<u8>>,
        old_size: usize,
        new_size: usize,
    ) -> Result<Option<NonNull<u8>>> {
        log::trace!(
            "system reallocate: ptr={:?}, old_size={old_size}, new_size={new_size}",
            ptr.map(NonNull::as_ptr)
        );
        let raw = match ptr {
            Some(ptr) if new_size == 0 => {
                let layout = block_layout(old_size)?;
                unsafe { dealloc(ptr.as_ptr(), layout) };
                return Ok(None);
            }
            Some(ptr) => {
                let old_layout = block_layout(old_size)?;
                let new_layout = block_layout(new_size)?;
                unsafe { realloc(ptr.as_ptr(), old_layout, new_layout.size()) }
            }
            None => unsafe { alloc(block_layout(new_size)?) },
        };
        match NonNull::new(raw) {
            Some(block) => Ok(Some(block)),
            None => Err(Error::memory_exhausted(new_size)),
        }
    }
}
