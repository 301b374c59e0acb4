//! Growable byte writer with patchable markers.

use std::marker::PhantomData;

use crate::error::{BufferError, BufferResult};
use crate::value::WireValue;

/// Default ceiling for a single writer (16 MiB).
pub const DEFAULT_MAX_LEN: usize = 16 * 1024 * 1024;

/// A reserved slot in a [`ByteWriter`] that is filled in after the fact.
///
/// Markers are produced by [`ByteWriter::create_marker`] and consumed by
/// [`ByteWriter::patch`]. A marker only makes sense for the writer that
/// created it and until that writer is cleared.
#[derive(Debug)]
pub struct Marker<T> {
    offset: usize,
    _value: PhantomData<fn() -> T>,
}

impl<T> Marker<T> {
    /// Byte offset of the reserved slot.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }
}

impl<T> Clone for Marker<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Marker<T> {}

/// A growable little-endian byte writer.
///
/// The backing storage grows on demand up to a ceiling; writes past the
/// ceiling fail with [`BufferError::CapacityExceeded`] and leave the buffer
/// unchanged.
#[derive(Debug, Clone)]
pub struct ByteWriter {
    bytes: Vec<u8>,
    max_len: usize,
}

impl Default for ByteWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteWriter {
    /// Creates an empty writer with the default ceiling.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            max_len: DEFAULT_MAX_LEN,
        }
    }

    /// Creates a writer with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            max_len: DEFAULT_MAX_LEN,
        }
    }

    /// Creates a writer that refuses to grow past `max_len` bytes.
    #[must_use]
    pub const fn with_limit(max_len: usize) -> Self {
        Self {
            bytes: Vec::new(),
            max_len,
        }
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Maximum length this writer will grow to.
    #[must_use]
    pub const fn max_len(&self) -> usize {
        self.max_len
    }

    /// Changes the ceiling. Bytes already written are kept.
    pub fn set_max_len(&mut self, max_len: usize) {
        self.max_len = max_len;
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Clears the contents but keeps the allocation.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Consumes the writer and returns the written bytes.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }

    /// Appends a fixed-size value.
    pub fn write<T: WireValue>(&mut self, value: T) -> BufferResult<()> {
        let start = self.grow(T::SIZE)?;
        value.write_le(&mut self.bytes[start..]);
        Ok(())
    }

    /// Appends raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> BufferResult<()> {
        self.check(bytes.len())?;
        self.bytes.extend_from_slice(bytes);
        Ok(())
    }

    /// Reserves `T::SIZE` zeroed bytes and returns a marker to patch them later.
    pub fn create_marker<T: WireValue>(&mut self) -> BufferResult<Marker<T>> {
        let offset = self.grow(T::SIZE)?;
        Ok(Marker {
            offset,
            _value: PhantomData,
        })
    }

    /// Overwrites the slot reserved by `marker`.
    pub fn patch<T: WireValue>(&mut self, marker: Marker<T>, value: T) -> BufferResult<()> {
        let end = marker.offset.checked_add(T::SIZE);
        match end {
            Some(end) if end <= self.bytes.len() => {
                value.write_le(&mut self.bytes[marker.offset..end]);
                Ok(())
            }
            _ => Err(BufferError::MarkerOutOfRange {
                offset: marker.offset,
                size: T::SIZE,
                len: self.bytes.len(),
            }),
        }
    }

    fn check(&self, additional: usize) -> BufferResult<()> {
        let requested = self.bytes.len().saturating_add(additional);
        if requested > self.max_len {
            return Err(BufferError::CapacityExceeded {
                requested,
                limit: self.max_len,
            });
        }
        Ok(())
    }

    fn grow(&mut self, additional: usize) -> BufferResult<usize> {
        self.check(additional)?;
        let start = self.bytes.len();
        self.bytes.resize(start + additional, 0);
        Ok(start)
    }
}
