//! Error types for buffer operations.

use std::fmt;

/// Result type for buffer operations.
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur while writing or reading a byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// Attempted to read past the end of the buffer.
    EndOfBuffer {
        /// Number of bytes requested.
        requested: usize,
        /// Number of bytes available.
        available: usize,
    },

    /// A write would grow the buffer past its ceiling.
    CapacityExceeded {
        /// Total length the write would have produced.
        requested: usize,
        /// Maximum length of the writer.
        limit: usize,
    },

    /// A marker does not point at a reserved region of this writer.
    MarkerOutOfRange {
        /// Offset the marker points to.
        offset: usize,
        /// Size of the patched value.
        size: usize,
        /// Current writer length.
        len: usize,
    },

    /// Attempted to move a reader cursor outside its buffer.
    SeekOutOfRange {
        /// Requested position.
        position: usize,
        /// Buffer length.
        len: usize,
    },
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndOfBuffer {
                requested,
                available,
            } => {
                write!(
                    f,
                    "attempted to read {requested} bytes but only {available} bytes available"
                )
            }
            Self::CapacityExceeded { requested, limit } => {
                write!(
                    f,
                    "write would grow buffer to {requested} bytes, limit is {limit} bytes"
                )
            }
            Self::MarkerOutOfRange { offset, size, len } => {
                write!(
                    f,
                    "marker at offset {offset} (size {size}) is outside buffer of {len} bytes"
                )
            }
            Self::SeekOutOfRange { position, len } => {
                write!(f, "cannot seek to {position}, buffer is {len} bytes")
            }
        }
    }
}

impl std::error::Error for BufferError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_end_of_buffer() {
        let err = BufferError::EndOfBuffer {
            requested: 8,
            available: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("8 bytes"), "should mention requested bytes");
        assert!(msg.contains("3 bytes"), "should mention available bytes");
        assert!(msg.contains("read"), "should mention read operation");
    }

    #[test]
    fn error_display_capacity_exceeded() {
        let err = BufferError::CapacityExceeded {
            requested: 100,
            limit: 64,
        };
        let msg = err.to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("64"));
    }

    #[test]
    fn error_display_marker_out_of_range() {
        let err = BufferError::MarkerOutOfRange {
            offset: 10,
            size: 4,
            len: 12,
        };
        let msg = err.to_string();
        assert!(msg.contains("offset 10"));
        assert!(msg.contains("12 bytes"));
    }

    #[test]
    fn error_display_seek_out_of_range() {
        let err = BufferError::SeekOutOfRange {
            position: 20,
            len: 5,
        };
        assert!(err.to_string().contains("20"));
    }

    #[test]
    fn error_is_std_error() {
        fn assert_error<E: std::error::Error>() {}
        assert_error::<BufferError>();
    }
}
