//! Bounds-checked byte reader.

use crate::error::{BufferError, BufferResult};
use crate::value::WireValue;

/// A cursor over a borrowed byte slice.
///
/// Every read is bounds-checked; a failed read leaves the cursor where it was.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// Total length of the underlying slice.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true when no bytes remain.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Current cursor position.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Number of unread bytes.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    /// Reads a fixed-size value.
    pub fn read<T: WireValue>(&mut self) -> BufferResult<T> {
        let bytes = self.read_bytes(T::SIZE)?;
        Ok(T::read_le(bytes))
    }

    /// Reads `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> BufferResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(BufferError::EndOfBuffer {
                requested: len,
                available: self.remaining(),
            });
        }
        let start = self.position;
        self.position += len;
        Ok(&self.bytes[start..self.position])
    }

    /// Advances the cursor by `len` bytes.
    pub fn skip(&mut self, len: usize) -> BufferResult<()> {
        self.read_bytes(len).map(|_| ())
    }

    /// Moves the cursor to an absolute position (`position == len` is allowed).
    pub fn seek(&mut self, position: usize) -> BufferResult<()> {
        if position > self.bytes.len() {
            return Err(BufferError::SeekOutOfRange {
                position,
                len: self.bytes.len(),
            });
        }
        self.position = position;
        Ok(())
    }

    /// Returns the unread part of the buffer without advancing.
    #[must_use]
    pub fn rest(&self) -> &'a [u8] {
        &self.bytes[self.position..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_past_end_fails_without_advancing() {
        let mut reader = ByteReader::new(&[1, 2, 3]);
        assert_eq!(reader.read::<u8>().unwrap(), 1);
        let err = reader.read::<u32>().unwrap_err();
        assert_eq!(
            err,
            BufferError::EndOfBuffer {
                requested: 4,
                available: 2
            }
        );
        assert_eq!(reader.position(), 1);
        assert_eq!(reader.read::<u16>().unwrap(), 0x0302);
        assert!(reader.is_empty());
    }

    #[test]
    fn seek_bounds() {
        let mut reader = ByteReader::new(&[0; 4]);
        reader.seek(4).unwrap();
        assert!(reader.is_empty());
        assert!(matches!(
            reader.seek(5),
            Err(BufferError::SeekOutOfRange { position: 5, len: 4 })
        ));
        reader.seek(1).unwrap();
        assert_eq!(reader.remaining(), 3);
    }

    #[test]
    fn read_bytes_borrows_input() {
        let data = [5u8, 6, 7, 8];
        let mut reader = ByteReader::new(&data);
        reader.skip(1).unwrap();
        let slice = reader.read_bytes(2).unwrap();
        assert_eq!(slice, &[6, 7]);
        assert_eq!(reader.rest(), &[8]);
    }

    #[test]
    fn empty_reader() {
        let reader = ByteReader::new(&[]);
        assert!(reader.is_empty());
        assert_eq!(reader.len(), 0);
    }
}
