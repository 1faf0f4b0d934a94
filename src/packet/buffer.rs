//! Growable byte buffer with a zero-filled tail guard
//!
//! Decoders routinely read a few bytes past the end of a packet payload
//! with fixed-width loads. `PaddedBuffer` keeps [`PACKET_PADDING`] zero
//! bytes allocated past its logical length at all times so such overreads
//! stay in bounds without per-read checks.

/// Number of guaranteed zero bytes past the logical end of a packet payload
pub const PACKET_PADDING: usize = 32;

/// Owned byte buffer whose tail guard region is always present and zeroed
#[derive(Clone, Default)]
pub struct PaddedBuffer {
    buf: Vec<u8>,
    len: usize,
}

impl PaddedBuffer {
    /// Create an empty buffer (guard region allocated lazily)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer holding a copy of `data`
    pub fn from_slice(data: &[u8]) -> Self {
        let mut ret = Self::new();
        ret.set_from_slice(data);
        ret
    }

    /// Resize to `len` logical bytes, keeping existing content up to `len`
    ///
    /// Newly exposed bytes and the guard region are zeroed. Shrinking keeps
    /// the allocation.
    pub fn alloc(&mut self, len: usize) {
        if self.buf.len() < len + PACKET_PADDING {
            self.buf.resize(len + PACKET_PADDING, 0);
        }
        // Re-zero the guard in case it was previously payload
        for b in &mut self.buf[len..len + PACKET_PADDING] {
            *b = 0;
        }
        self.len = len;
    }

    /// Replace the content with a copy of `data`
    pub fn set_from_slice(&mut self, data: &[u8]) {
        self.alloc(data.len());
        self.buf[..data.len()].copy_from_slice(data);
    }

    /// Append `data` after the current logical end
    pub fn append(&mut self, data: &[u8]) {
        let old_len = self.len;
        self.alloc(old_len + data.len());
        self.buf[old_len..old_len + data.len()].copy_from_slice(data);
    }

    /// Drop the content, keeping the allocation
    pub fn clear(&mut self) {
        self.alloc(0);
    }

    /// Logical length in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer holds no payload
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Payload bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Payload bytes plus the zeroed guard region
    pub fn as_padded_slice(&self) -> &[u8] {
        if self.buf.is_empty() {
            return &[];
        }
        &self.buf[..self.len + PACKET_PADDING]
    }

    /// Mutable payload bytes
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf[..self.len]
    }
}

impl PartialEq for PaddedBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for PaddedBuffer {}

impl std::fmt::Debug for PaddedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaddedBuffer").field("len", &self.len).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_always_zeroed() {
        let mut buf = PaddedBuffer::new();
        buf.set_from_slice(&[0xAA; 64]);
        assert_eq!(buf.len(), 64);
        assert_eq!(&buf.as_padded_slice()[64..], &[0u8; PACKET_PADDING]);

        // Shrink: former payload bytes now sit in the guard region
        buf.alloc(16);
        assert_eq!(buf.len(), 16);
        assert_eq!(&buf.as_padded_slice()[16..16 + PACKET_PADDING], &[0u8; PACKET_PADDING]);
        // Content up to the new length is preserved
        assert_eq!(buf.as_slice(), &[0xAA; 16]);
    }

    #[test]
    fn test_append() {
        let mut buf = PaddedBuffer::from_slice(b"abc");
        buf.append(b"def");
        assert_eq!(buf.as_slice(), b"abcdef");
        assert_eq!(&buf.as_padded_slice()[6..], &[0u8; PACKET_PADDING]);
    }

    #[test]
    fn test_clear_keeps_allocation() {
        let mut buf = PaddedBuffer::from_slice(&[1; 1024]);
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.as_padded_slice().len(), PACKET_PADDING);
    }

    #[test]
    fn test_empty_padded_slice() {
        let buf = PaddedBuffer::new();
        assert!(buf.as_padded_slice().is_empty());
    }
}
