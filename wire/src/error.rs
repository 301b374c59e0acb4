//! Error types for wire framing.

use std::fmt;

use buffer::BufferError;

/// Result type for wire decoding.
pub type WireResult<T> = Result<T, DecodeError>;

/// Errors that can occur while decoding a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    /// Frame is too small to contain the header.
    FrameTooSmall { actual: usize, required: usize },

    /// Message type byte is not one this decoder accepts.
    UnexpectedMessageType { found: u8 },

    /// Compression flag byte is neither 0 nor 1.
    InvalidCompressionFlag { found: u8 },

    /// Snapshot flags carry reserved bits.
    InvalidFlags { flags: u8 },

    /// A length field is negative.
    NegativeLength { value: i32 },

    /// Uncompressed payload length does not match the header.
    PayloadLengthMismatch { header_len: usize, actual_len: usize },

    /// Decompressed output length differs from the declared length.
    DecompressedLengthMismatch { declared: usize, actual: usize },

    /// The LZ4 block could not be decompressed.
    Decompression { reason: String },

    /// Limits exceeded.
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },

    /// Underlying buffer read failed.
    Buffer(BufferError),
}

/// Specific wire limits that can be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    FrameBytes,
    UncompressedBytes,
}

/// Errors that can occur during encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Payload length does not fit the i32 length field.
    LengthOverflow { length: usize },

    /// Payload is larger than the configured limit.
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },

    /// The LZ4 compressor rejected the input.
    Compression { reason: String },

    /// Underlying buffer write failed.
    Buffer(BufferError),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrameTooSmall { actual, required } => {
                write!(
                    f,
                    "frame too small: {actual} bytes, need at least {required}"
                )
            }
            Self::UnexpectedMessageType { found } => {
                write!(f, "unexpected message type: {found}")
            }
            Self::InvalidCompressionFlag { found } => {
                write!(f, "invalid compression flag: {found}")
            }
            Self::InvalidFlags { flags } => write!(f, "invalid snapshot flags: 0x{flags:02X}"),
            Self::NegativeLength { value } => write!(f, "negative length field: {value}"),
            Self::PayloadLengthMismatch {
                header_len,
                actual_len,
            } => {
                write!(
                    f,
                    "payload length mismatch: header {header_len} bytes but {actual_len} available"
                )
            }
            Self::DecompressedLengthMismatch { declared, actual } => {
                write!(
                    f,
                    "decompressed {actual} bytes but header declared {declared}"
                )
            }
            Self::Decompression { reason } => write!(f, "lz4 decompression failed: {reason}"),
            Self::LimitsExceeded {
                kind,
                limit,
                actual,
            } => {
                write!(f, "{kind} limit exceeded: {actual} > {limit}")
            }
            Self::Buffer(err) => write!(f, "buffer error: {err}"),
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FrameBytes => "frame bytes",
            Self::UncompressedBytes => "uncompressed bytes",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthOverflow { length } => write!(f, "length overflow: {length}"),
            Self::LimitsExceeded {
                kind,
                limit,
                actual,
            } => {
                write!(f, "{kind} limit exceeded: {actual} > {limit}")
            }
            Self::Compression { reason } => write!(f, "lz4 compression failed: {reason}"),
            Self::Buffer(err) => write!(f, "buffer error: {err}"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl std::error::Error for EncodeError {}

impl From<BufferError> for DecodeError {
    fn from(err: BufferError) -> Self {
        Self::Buffer(err)
    }
}

impl From<BufferError> for EncodeError {
    fn from(err: BufferError) -> Self {
        Self::Buffer(err)
    }
}
