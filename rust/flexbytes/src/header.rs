//! In-allocation header layout for the length-prefixed buffer.
//!
//! The header occupies the first [`HEADER_SIZE`] bytes of the allocation;
//! the payload follows immediately, in the same block.

use bytemuck::{Pod, Zeroable};
use flexbytes_common::{Error, Result};

/// The fixed prefix stored in front of the payload.
///
/// `capacity` counts payload bytes only (terminator slot included); the
/// header itself is not part of it.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub(crate) struct Header {
    pub len: usize,
    pub capacity: usize,
}

pub(crate) const HEADER_SIZE: usize = size_of::<Header>();

/// Computes the total allocation size for a payload of `payload_len` bytes:
/// header, payload, and one terminator slot.
pub(crate) fn total_size(payload_len: usize) -> Result<usize> {
    payload_len
        .checked_add(1)
        .and_then(|n| n.checked_add(HEADER_SIZE))
        .ok_or_else(|| Error::capacity_overflow(payload_len))
}
