//! Single-allocation, length-prefixed byte buffers.
//!
//! [`FlexBytes`] stores a fixed header (length and capacity) and a
//! variable-length payload in one contiguous heap allocation, avoiding the
//! second pointer indirection and the second allocate/free pair of a
//! header-plus-boxed-slice layout. The payload is followed by a single NUL
//! terminator byte so the contents can be handed to null-terminated-string
//! consumers.
//!
//! Every allocation and release goes through the [`Reallocator`] seam from
//! `flexbytes-alloc`, so the memory provider can be swapped (budgeted,
//! audited, or otherwise) without touching the buffer code.
//!
//! ```
//! use flexbytes::FlexBytes;
//!
//! let buf = FlexBytes::from_slice(b"Hi mom!").unwrap();
//! assert_eq!(buf.len(), 7);
//! assert_eq!(buf.capacity(), 8);
//! assert_eq!(&buf[..], b"Hi mom!");
//! assert_eq!(buf.as_bytes_with_nul(), b"Hi mom!\0");
//! ```

use std::fmt;
use std::ptr::NonNull;

use flexbytes_alloc::{Reallocator, SystemReallocator};
use flexbytes_common::Result;

use header::{HEADER_SIZE, Header};

mod header;

/// An immutable byte buffer whose header and payload share one allocation.
///
/// The handle owns the allocation exclusively; dropping it releases the
/// block through the reallocator it was constructed with, passing back the
/// full allocation size. There is no sharing and no in-place growth: the
/// contents are fixed at construction.
///
/// Invariant: `len() < capacity()` always holds; the capacity reserves at
/// least the one byte occupied by the NUL terminator.
pub struct FlexBytes<A: Reallocator = SystemReallocator> {
    /// Points at the start of the allocation (the header).
    ptr: NonNull<u8>,
    alloc: A,
}

impl FlexBytes<SystemReallocator> {
    /// Constructs a buffer holding a copy of `data`, allocated from the
    /// system allocator.
    pub fn from_slice(data: &[u8]) -> Result<FlexBytes> {
        FlexBytes::from_slice_in(data, SystemReallocator)
    }
}

impl<A: Reallocator> FlexBytes<A> {
    /// Constructs a buffer holding a copy of `data`, allocated from `alloc`.
    ///
    /// The payload is copied verbatim; embedded zero bytes are preserved. A
    /// NUL terminator is written at offset `data.len()`, and the buffer
    /// reports `capacity() == data.len() + 1`. A zero-length `data` still
    /// allocates (one header plus the terminator slot).
    ///
    /// Construction never partially succeeds: on error nothing was
    /// allocated.
    ///
    /// # Errors
    ///
    /// `MemoryExhausted` if the reallocator cannot satisfy the request,
    /// `CapacityOverflow` if the total allocation size is not representable.
    pub fn from_slice_in(data: &[u8], alloc: A) -> Result<FlexBytes<A>> {
        let total = header::total_size(data.len())?;
        let ptr = alloc.allocate(total)?;
        unsafe {
            ptr.as_ptr().cast::<Header>().write(Header {
                len: data.len(),
                capacity: data.len() + 1,
            });
            let payload = ptr.as_ptr().add(HEADER_SIZE);
            std::ptr::copy_nonoverlapping(data.as_ptr(), payload, data.len());
            payload.add(data.len()).write(0);
        }
        Ok(FlexBytes { ptr, alloc })
    }

    fn header(&self) -> &Header {
        let bytes = unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), HEADER_SIZE) };
        bytemuck::from_bytes(bytes)
    }

    /// Returns the number of payload bytes, excluding the terminator.
    #[inline]
    pub fn len(&self) -> usize {
        self.header().len
    }

    /// Returns `true` if the payload is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of payload bytes reserved in the allocation,
    /// including the terminator slot. Always greater than [`len`](Self::len).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.header().capacity
    }

    /// Returns the total size of the backing allocation in bytes: header
    /// plus payload capacity. This is the size passed back to the
    /// reallocator on release.
    #[inline]
    pub fn allocation_size(&self) -> usize {
        HEADER_SIZE + self.capacity()
    }

    /// Returns a raw pointer to the first payload byte.
    ///
    /// The pointee is valid for `capacity()` bytes and must not be accessed
    /// after the buffer is dropped.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        unsafe { self.ptr.as_ptr().add(HEADER_SIZE) }
    }

    /// Returns the payload bytes, excluding the terminator.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.as_ptr(), self.len()) }
    }

    /// Returns the payload bytes including the trailing NUL terminator, for
    /// handing to null-terminated-string consumers.
    #[inline]
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.as_ptr(), self.len() + 1) }
    }

    /// Returns a reference to the reallocator this buffer was constructed
    /// with.
    pub fn reallocator(&self) -> &A {
        &self.alloc
    }
}

impl<A: Reallocator> Drop for FlexBytes<A> {
    fn drop(&mut self) {
        let total = self.allocation_size();
        unsafe { self.alloc.deallocate(self.ptr, total) };
    }
}

// The buffer is exclusively owned and immutable after construction; thread
// safety reduces to that of the reallocator held for the release call.
unsafe impl<A: Reallocator + Send> Send for FlexBytes<A> {}
unsafe impl<A: Reallocator + Sync> Sync for FlexBytes<A> {}

impl<A: Reallocator> std::ops::Deref for FlexBytes<A> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<A: Reallocator> AsRef<[u8]> for FlexBytes<A> {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<A: Reallocator> fmt::Debug for FlexBytes<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlexBytes")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use flexbytes_alloc::{BudgetReallocator, CountingReallocator};
    use flexbytes_common::ErrorKind;

    use super::*;

    #[test]
    fn test_from_slice_basic() {
        let buf = FlexBytes::from_slice(b"Hi mom!").unwrap();
        assert_eq!(buf.len(), 7);
        assert_eq!(buf.capacity(), 8);
        assert!(!buf.is_empty());
        assert_eq!(buf.as_bytes(), b"Hi mom!");
        assert_eq!(buf.as_bytes_with_nul(), b"Hi mom!\0");
    }

    #[test]
    fn test_from_slice_empty() {
        let buf = FlexBytes::from_slice(b"").unwrap();
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.capacity(), 1);
        assert!(buf.is_empty());
        assert_eq!(buf.as_bytes(), b"");
        assert_eq!(buf.as_bytes_with_nul(), b"\0");
    }

    #[test]
    fn test_capacity_exceeds_len() {
        for n in [0usize, 1, 7, 63, 64, 65, 4096] {
            let data = vec![0x5Au8; n];
            let buf = FlexBytes::from_slice(&data).unwrap();
            assert_eq!(buf.len(), n);
            assert_eq!(buf.capacity(), n + 1);
            assert!(buf.capacity() > buf.len());
        }
    }

    #[test]
    fn test_payload_round_trip() {
        let data: Vec<u8> = (0..=255).collect();
        let buf = FlexBytes::from_slice(&data).unwrap();
        assert_eq!(buf.as_bytes(), &data[..]);
        assert_eq!(buf.as_bytes_with_nul()[data.len()], 0);
    }

    #[test]
    fn test_embedded_zeros_preserved() {
        let data = b"a\0b\0\0c";
        let buf = FlexBytes::from_slice(data).unwrap();
        assert_eq!(buf.len(), 6);
        assert_eq!(buf.as_bytes(), data);
        assert_eq!(buf.as_bytes_with_nul(), b"a\0b\0\0c\0");
    }

    #[test]
    fn test_deref_and_as_ref() {
        let buf = FlexBytes::from_slice(b"hello").unwrap();
        assert_eq!(&buf[..], b"hello");
        assert_eq!(&buf[1..4], b"ell");
        let r: &[u8] = buf.as_ref();
        assert_eq!(r, b"hello");
    }

    #[test]
    fn test_allocation_size() {
        let buf = FlexBytes::from_slice(b"hello").unwrap();
        assert_eq!(buf.allocation_size(), 2 * size_of::<usize>() + 6);
    }

    #[test]
    fn test_debug() {
        let buf = FlexBytes::from_slice(b"hey").unwrap();
        let s = format!("{buf:?}");
        assert!(s.contains("len: 3"));
        assert!(s.contains("capacity: 4"));
    }

    #[test]
    fn test_construction_through_budget() {
        let alloc = BudgetReallocator::with_budget(1024);
        let buf = FlexBytes::from_slice_in(b"hello", alloc.clone()).unwrap();
        assert_eq!(alloc.remaining(), 1024 - buf.allocation_size() as u64);
        drop(buf);
        assert_eq!(alloc.remaining(), 1024);
    }

    #[test]
    fn test_exhausted_budget_surfaces_error() {
        // The whole header does not even fit; construction must fail
        // without aborting and without leaking the reservation.
        let alloc = BudgetReallocator::with_budget(4);
        let err = FlexBytes::from_slice_in(b"payload", alloc.clone()).expect_err("over budget");
        assert!(matches!(err.kind(), ErrorKind::MemoryExhausted { .. }));
        assert_eq!(alloc.remaining(), 4);
    }

    #[test]
    fn test_every_construction_balanced_by_one_release() {
        let audit = CountingReallocator::system();
        {
            let a = FlexBytes::from_slice_in(b"one", audit.clone()).unwrap();
            let b = FlexBytes::from_slice_in(b"two", audit.clone()).unwrap();
            assert_eq!(audit.stats().live_blocks(), 2);
            drop(a);
            assert_eq!(audit.stats().live_blocks(), 1);
            drop(b);
        }
        let stats = audit.stats();
        assert_eq!(stats.allocations, stats.releases);
        assert_eq!(stats.live_blocks(), 0);
        assert_eq!(stats.live_bytes(), 0);
    }

    #[test]
    fn test_construct_destroy_stress() {
        let audit = CountingReallocator::system();
        fastrand::seed(0x5EED);
        for i in 0..10_000 {
            let len = fastrand::usize(..512);
            let data: Vec<u8> = (0..len).map(|j| (i + j) as u8).collect();
            let buf = FlexBytes::from_slice_in(&data, audit.clone()).unwrap();
            assert_eq!(buf.len(), len);
            assert_eq!(buf.capacity(), len + 1);
            assert_eq!(buf.as_bytes(), &data[..]);
            assert_eq!(buf.as_bytes_with_nul()[len], 0);
        }
        let stats = audit.stats();
        assert_eq!(stats.allocations, 10_000);
        assert_eq!(stats.releases, 10_000);
        assert_eq!(stats.live_blocks(), 0);
        assert_eq!(stats.live_bytes(), 0);
    }

    #[test]
    fn test_send_to_another_thread() {
        let buf = FlexBytes::from_slice(b"across threads").unwrap();
        let handle = std::thread::spawn(move || buf.len());
        assert_eq!(handle.join().unwrap(), 14);
    }
}
