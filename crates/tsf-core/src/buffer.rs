//! Growable output buffer.
//!
//! Output starts in a caller-supplied region (often a stack array) and is
//! promoted to an owned heap block the first time it overflows. Growth at
//! least doubles the capacity, so a long output costs a logarithmic number
//! of copies.
//!
//! Invariants:
//! - `pos <= capacity()` after every operation
//! - once owned, storage never goes back to borrowed

use crate::error::FormatError;

#[derive(Debug)]
enum Storage<'b> {
    Borrowed(&'b mut [u8]),
    /// Always zero-filled to its full length, so `len()` is the capacity.
    Owned(Vec<u8>),
}

impl Storage<'_> {
    fn bytes(&self) -> &[u8] {
        match self {
            Storage::Borrowed(slice) => slice,
            Storage::Owned(vec) => vec,
        }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        match self {
            Storage::Borrowed(slice) => slice,
            Storage::Owned(vec) => vec,
        }
    }
}

/// Output cursor over borrowed or owned storage.
#[derive(Debug)]
pub struct OutputBuffer<'b> {
    storage: Storage<'b>,
    pos: usize,
}

impl<'b> OutputBuffer<'b> {
    /// Start writing into `initial`. A zero-length region is allowed; the
    /// first write then promotes straight to the heap.
    pub fn new(initial: &'b mut [u8]) -> Self {
        Self {
            storage: Storage::Borrowed(initial),
            pos: 0,
        }
    }

    /// Start with no caller storage at all. Like any zero-length region,
    /// it stays borrowed until the first write.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(&mut [])
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.bytes().len()
    }

    /// Write cursor: bytes of output produced so far.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub fn remaining_space(&self) -> usize {
        self.capacity() - self.pos
    }

    /// True once the output has been promoted to the heap.
    #[must_use]
    pub fn is_owned(&self) -> bool {
        matches!(self.storage, Storage::Owned(_))
    }

    /// Ensure at least `additional` writable bytes past the cursor.
    ///
    /// New capacity is `max(capacity * 2, pos + additional)`. Allocation is
    /// fallible; exhaustion is reported rather than aborting.
    pub fn reserve(&mut self, additional: usize) -> Result<(), FormatError> {
        let required = self
            .pos
            .checked_add(additional)
            .ok_or_else(|| FormatError::out_of_memory(usize::MAX, None))?;
        let capacity = self.capacity();
        if required <= capacity {
            return Ok(());
        }
        let new_capacity = capacity.saturating_mul(2).max(required);

        match &mut self.storage {
            Storage::Owned(vec) => {
                vec.try_reserve_exact(new_capacity - vec.len())
                    .map_err(|e| FormatError::out_of_memory(new_capacity, Some(e)))?;
                vec.resize(new_capacity, 0);
                log::trace!("output buffer grew {capacity} -> {new_capacity} bytes");
            }
            Storage::Borrowed(slice) => {
                let mut vec = Vec::new();
                vec.try_reserve_exact(new_capacity)
                    .map_err(|e| FormatError::out_of_memory(new_capacity, Some(e)))?;
                vec.extend_from_slice(&slice[..self.pos]);
                vec.resize(new_capacity, 0);
                log::trace!(
                    "output buffer promoted to heap at {} bytes ({capacity} borrowed)",
                    new_capacity
                );
                self.storage = Storage::Owned(vec);
            }
        }
        Ok(())
    }

    /// Claim exactly `n` bytes at the cursor and advance past them.
    pub fn add_uninitialized(&mut self, n: usize) -> Result<&mut [u8], FormatError> {
        self.reserve(n)?;
        let start = self.pos;
        self.pos += n;
        Ok(&mut self.storage.bytes_mut()[start..start + n])
    }

    /// Give back `n` bytes claimed past the end of the real output.
    pub fn retract(&mut self, n: usize) {
        debug_assert!(n <= self.pos, "retract past start of buffer");
        self.pos -= n.min(self.pos);
    }

    /// Commit `n` bytes written directly into [`spare_mut`](Self::spare_mut).
    pub fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.remaining_space(), "advance past capacity");
        self.pos += n.min(self.remaining_space());
    }

    /// The writable region between the cursor and the end of storage.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        let pos = self.pos;
        &mut self.storage.bytes_mut()[pos..]
    }

    pub fn push(&mut self, byte: u8) -> Result<(), FormatError> {
        self.add_uninitialized(1)?[0] = byte;
        Ok(())
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<(), FormatError> {
        self.add_uninitialized(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Output produced so far, without terminator.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.storage.bytes()[..self.pos]
    }

    /// Terminate the output with a NUL and hand it back, in place if it
    /// never outgrew the caller's region.
    pub fn finish(mut self) -> Result<Formatted<'b>, FormatError> {
        self.push(0)?;
        let pos = self.pos;
        Ok(match self.storage {
            Storage::Borrowed(slice) => {
                let slice: &'b [u8] = slice;
                Formatted::Borrowed(&slice[..pos])
            }
            Storage::Owned(mut vec) => {
                vec.truncate(pos);
                Formatted::Owned(vec)
            }
        })
    }
}

/// A finished, NUL-terminated output.
///
/// The terminator is stored but not counted by [`len`](Self::len) or
/// included in [`as_bytes`](Self::as_bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formatted<'b> {
    /// The output lives in the caller's buffer.
    Borrowed(&'b [u8]),
    /// The output outgrew the caller's buffer and was moved to the heap.
    Owned(Vec<u8>),
}

impl Formatted<'_> {
    /// Output length excluding the terminator.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes_with_nul().len().saturating_sub(1)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        let bytes = self.as_bytes_with_nul();
        &bytes[..bytes.len().saturating_sub(1)]
    }

    #[must_use]
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        match self {
            Formatted::Borrowed(bytes) => bytes,
            Formatted::Owned(vec) => vec,
        }
    }

    #[must_use]
    pub fn is_borrowed(&self) -> bool {
        matches!(self, Formatted::Borrowed(_))
    }

    /// Copy (or move) the output into a `Vec` without the terminator.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        match self {
            Formatted::Borrowed(bytes) => bytes[..bytes.len().saturating_sub(1)].to_vec(),
            Formatted::Owned(mut vec) => {
                vec.pop();
                vec
            }
        }
    }

    /// Decode as UTF-8, replacing invalid sequences with U+FFFD.
    #[must_use]
    pub fn into_string_lossy(self) -> String {
        match String::from_utf8(self.into_vec()) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_in_borrowed_storage() {
        let mut backing = [0u8; 16];
        let mut buf = OutputBuffer::new(&mut backing);
        buf.extend_from_slice(b"hello").unwrap();
        assert_eq!(buf.pos(), 5);
        assert!(!buf.is_owned());
        let out = buf.finish().unwrap();
        assert!(out.is_borrowed());
        assert_eq!(out.as_bytes(), b"hello");
        assert_eq!(out.as_bytes_with_nul(), b"hello\0");
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn test_terminator_forces_promotion() {
        let mut backing = [0u8; 5];
        let mut buf = OutputBuffer::new(&mut backing);
        buf.extend_from_slice(b"hello").unwrap();
        assert!(!buf.is_owned());
        let out = buf.finish().unwrap();
        assert!(!out.is_borrowed());
        assert_eq!(out.as_bytes(), b"hello");
    }

    #[test]
    fn test_growth_policy_doubles() {
        let mut backing = [0u8; 8];
        let mut buf = OutputBuffer::new(&mut backing);
        buf.extend_from_slice(b"abcdef").unwrap();
        buf.reserve(4).unwrap();
        assert_eq!(buf.capacity(), 16);
        assert!(buf.is_owned());
        assert_eq!(buf.as_bytes(), b"abcdef");

        // A request larger than double wins outright.
        buf.reserve(100).unwrap();
        assert_eq!(buf.capacity(), 106);
    }

    #[test]
    fn test_zero_capacity_start() {
        let mut buf = OutputBuffer::new(&mut []);
        assert_eq!(buf.capacity(), 0);
        buf.push(b'x').unwrap();
        assert_eq!(buf.capacity(), 1);
        assert_eq!(buf.finish().unwrap().as_bytes(), b"x");

        let mut buf = OutputBuffer::empty();
        assert!(!buf.is_owned());
        assert_eq!(buf.capacity(), 0);
        buf.extend_from_slice(b"abc").unwrap();
        assert!(buf.is_owned());
        assert_eq!(buf.finish().unwrap().into_vec(), b"abc");
    }

    #[test]
    fn test_retract_and_advance() {
        let mut backing = [0u8; 32];
        let mut buf = OutputBuffer::new(&mut backing);
        let region = buf.add_uninitialized(10).unwrap();
        region[..3].copy_from_slice(b"abc");
        buf.retract(7);
        assert_eq!(buf.as_bytes(), b"abc");

        let spare = buf.spare_mut();
        assert_eq!(spare.len(), 29);
        spare[..2].copy_from_slice(b"de");
        buf.advance(2);
        assert_eq!(buf.as_bytes(), b"abcde");
        assert_eq!(buf.remaining_space(), 27);
    }

    #[test]
    fn test_pos_never_exceeds_capacity() {
        let mut backing = [0u8; 3];
        let mut buf = OutputBuffer::new(&mut backing);
        for i in 0..5000u32 {
            buf.push(b'a' + (i % 26) as u8).unwrap();
            assert!(buf.pos() <= buf.capacity());
            if i % 7 == 0 {
                buf.reserve(i as usize % 13).unwrap();
                assert!(buf.pos() <= buf.capacity());
            }
        }
        assert_eq!(buf.pos(), 5000);
        let out = buf.finish().unwrap();
        assert_eq!(out.len(), 5000);
        assert_eq!(&out.as_bytes()[..3], b"abc");
    }

    #[test]
    fn test_impossible_reservation_is_an_error() {
        let mut buf = OutputBuffer::empty();
        buf.push(b'a').unwrap();
        let err = buf.reserve(usize::MAX).unwrap_err();
        assert!(matches!(err, FormatError::OutOfMemory { .. }));
        // The buffer is still usable afterwards.
        buf.push(b'b').unwrap();
        assert_eq!(buf.as_bytes(), b"ab");
    }

    #[test]
    fn test_lossy_string_conversion() {
        let out = Formatted::Owned(vec![b'o', b'k', 0xff, 0]);
        assert_eq!(out.into_string_lossy(), "ok\u{FFFD}");
        let out = Formatted::Borrowed(b"fine\0");
        assert_eq!(out.clone().into_vec(), b"fine");
        assert_eq!(out.into_string_lossy(), "fine");
    }
}
