//! `Buffer`: a double-ended byte queue with delimiter search, used for
//! both a connection's read-side and write-side staging area.

use bytes::{Buf, BytesMut};

/// Initial reserve for a fresh connection's buffers.
const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
pub struct Buffer {
    inner: BytesMut,
}

impl Buffer {
    pub fn new() -> Self {
        Self { inner: BytesMut::with_capacity(DEFAULT_CAPACITY) }
    }

    pub fn push_back(&mut self, bytes: &[u8]) {
        self.inner.extend_from_slice(bytes);
    }

    pub fn push_back_str(&mut self, s: &str) {
        self.push_back(s.as_bytes());
    }

    pub fn push_front(&mut self, bytes: &[u8]) {
        let mut merged = BytesMut::with_capacity(bytes.len() + self.inner.len());
        merged.extend_from_slice(bytes);
        merged.extend_from_slice(&self.inner);
        self.inner = merged;
    }

    pub fn push_front_str(&mut self, s: &str) {
        self.push_front(s.as_bytes());
    }

    /// Search for `delimiter`. If found, remove and return the prefix
    /// (including the delimiter) from the front of the buffer. If absent,
    /// the buffer is left untouched and `None` is returned.
    pub fn find_and_pop_till(&mut self, delimiter: &[u8]) -> Option<Vec<u8>> {
        let pos = find_subslice(&self.inner, delimiter)?;
        let split_at = pos + delimiter.len();
        let prefix = self.inner.split_to(split_at);
        Some(prefix.to_vec())
    }

    pub fn size(&self) -> usize {
        self.inner.len()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn data(&self) -> &[u8] {
        &self.inner
    }

    pub fn as_string_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.inner)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drop the first `n` bytes without returning them.
    pub fn advance(&mut self, n: usize) {
        self.inner.advance(n.min(self.inner.len()));
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
