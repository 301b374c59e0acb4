//! Error types for pattern registration and exchange.

use std::fmt;

use buffer::BufferError;

/// Result type for pattern operations.
pub type PatternResult<T> = Result<T, PatternError>;

/// Errors from the pattern bank and announcement codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// Pattern names must be non-empty.
    EmptyName,

    /// Pattern name exceeds the maximum length.
    NameTooLong { len: usize, max: usize },

    /// Pattern name bytes are not UTF-8.
    InvalidUtf8,

    /// Too many patterns in one bank or announcement.
    TooManyPatterns { count: usize, max: usize },

    /// A count or length field is negative.
    NegativeLength { value: i32 },

    /// The same id appears twice in an announcement.
    DuplicateId { id: i32 },

    /// The same name appears twice in an announcement.
    DuplicateName { name: String },

    /// Announcement hash does not match its entries.
    HashMismatch { expected: u64, actual: u64 },

    /// Underlying buffer operation failed.
    Buffer(BufferError),
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "pattern name is empty"),
            Self::NameTooLong { len, max } => {
                write!(f, "pattern name is {len} bytes, maximum is {max}")
            }
            Self::InvalidUtf8 => write!(f, "pattern name is not valid UTF-8"),
            Self::TooManyPatterns { count, max } => {
                write!(f, "{count} patterns exceeds maximum of {max}")
            }
            Self::NegativeLength { value } => write!(f, "negative length field: {value}"),
            Self::DuplicateId { id } => write!(f, "duplicate pattern id {id}"),
            Self::DuplicateName { name } => write!(f, "duplicate pattern name '{name}'"),
            Self::HashMismatch { expected, actual } => {
                write!(
                    f,
                    "pattern hash mismatch: announced 0x{expected:016X}, computed 0x{actual:016X}"
                )
            }
            Self::Buffer(err) => write!(f, "buffer error: {err}"),
        }
    }
}

impl std::error::Error for PatternError {}

impl From<BufferError> for PatternError {
    fn from(err: BufferError) -> Self {
        Self::Buffer(err)
    }
}
