//! Error types for snapshot generation and application.

use std::fmt;

use buffer::BufferError;
use pattern::PatternError;

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors raised while generating, applying or routing snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SnapshotError {
    /// Buffer read or write failed (truncated or oversized data).
    Buffer(BufferError),

    /// Frame decoding failed.
    Decode(wire::DecodeError),

    /// Frame encoding failed.
    Encode(wire::EncodeError),

    /// Pattern registration or announcement failed.
    Pattern(PatternError),

    /// A record discriminant is not 0, 1 or 2.
    InvalidDiscriminant { value: u8 },

    /// The same snapshot entity is listed twice.
    DuplicateEntity { index: i32, version: i32 },

    /// A count field is negative.
    NegativeCount { field: &'static str, value: i32 },

    /// A slice end offset lies before its body or past the payload.
    InvalidEndOffset {
        end_offset: i32,
        position: usize,
        len: usize,
    },

    /// A configured limit was exceeded.
    LimitsExceeded {
        kind: SnapshotLimitKind,
        limit: usize,
        actual: usize,
    },

    /// A streamer wrote a payload of the wrong size.
    PayloadSizeMismatch {
        pattern: String,
        expected: usize,
        actual: usize,
    },

    /// A streamer with this pattern is already registered.
    DuplicatePattern { pattern: String },

    /// A streamer's pattern is missing from the bank.
    UnregisteredPattern { pattern: String },

    /// No state exists for the connection.
    UnknownConnection { connection: u32 },

    /// A peer id has no translation in the connection's exchange.
    UntranslatedPattern { connection: u32, pattern_id: i32 },

    /// The transport refused a packet.
    Transport { reason: String },
}

/// Snapshot limits that can be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotLimitKind {
    Entities,
    Streamers,
    SnapshotBytes,
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffer(err) => write!(f, "buffer error: {err}"),
            Self::Decode(err) => write!(f, "frame decode error: {err}"),
            Self::Encode(err) => write!(f, "frame encode error: {err}"),
            Self::Pattern(err) => write!(f, "pattern error: {err}"),
            Self::InvalidDiscriminant { value } => {
                write!(f, "invalid record discriminant {value}")
            }
            Self::DuplicateEntity { index, version } => {
                write!(f, "entity ({index}, {version}) listed more than once")
            }
            Self::NegativeCount { field, value } => {
                write!(f, "negative {field} count: {value}")
            }
            Self::InvalidEndOffset {
                end_offset,
                position,
                len,
            } => {
                write!(
                    f,
                    "slice end offset {end_offset} is outside [{position}, {len}]"
                )
            }
            Self::LimitsExceeded {
                kind,
                limit,
                actual,
            } => {
                write!(f, "{kind} limit exceeded: {actual} > {limit}")
            }
            Self::PayloadSizeMismatch {
                pattern,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "streamer '{pattern}' wrote {actual} payload bytes, expected {expected}"
                )
            }
            Self::DuplicatePattern { pattern } => {
                write!(f, "streamer '{pattern}' is already registered")
            }
            Self::UnregisteredPattern { pattern } => {
                write!(f, "pattern '{pattern}' is not in the bank")
            }
            Self::UnknownConnection { connection } => {
                write!(f, "unknown connection {connection}")
            }
            Self::UntranslatedPattern {
                connection,
                pattern_id,
            } => {
                write!(
                    f,
                    "pattern id {pattern_id} from connection {connection} has no local translation"
                )
            }
            Self::Transport { reason } => write!(f, "transport error: {reason}"),
        }
    }
}

impl fmt::Display for SnapshotLimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Entities => "entity count",
            Self::Streamers => "streamer count",
            Self::SnapshotBytes => "snapshot bytes",
        };
        write!(f, "{name}")
    }
}

impl std::error::Error for SnapshotError {}

impl From<BufferError> for SnapshotError {
    fn from(err: BufferError) -> Self {
        Self::Buffer(err)
    }
}

impl From<wire::DecodeError> for SnapshotError {
    fn from(err: wire::DecodeError) -> Self {
        Self::Decode(err)
    }
}

impl From<wire::EncodeError> for SnapshotError {
    fn from(err: wire::EncodeError) -> Self {
        Self::Encode(err)
    }
}

impl From<PatternError> for SnapshotError {
    fn from(err: PatternError) -> Self {
        Self::Pattern(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_invalid_end_offset() {
        let err = SnapshotError::InvalidEndOffset {
            end_offset: 3,
            position: 10,
            len: 40,
        };
        let msg = err.to_string();
        assert!(msg.contains('3'));
        assert!(msg.contains("10"));
        assert!(msg.contains("40"));
    }

    #[test]
    fn error_display_payload_size() {
        let err = SnapshotError::PayloadSizeMismatch {
            pattern: "auto.transform.Position".to_string(),
            expected: 12,
            actual: 8,
        };
        let msg = err.to_string();
        assert!(msg.contains("Position"));
        assert!(msg.contains("12"));
    }

    #[test]
    fn error_display_limits() {
        let err = SnapshotError::LimitsExceeded {
            kind: SnapshotLimitKind::Entities,
            limit: 4,
            actual: 9,
        };
        assert!(err.to_string().contains("entity count"));
    }

    #[test]
    fn error_from_buffer() {
        let err: SnapshotError = BufferError::EndOfBuffer {
            requested: 12,
            available: 3,
        }
        .into();
        assert!(matches!(err, SnapshotError::Buffer(_)));
    }

    #[test]
    fn error_is_std_error() {
        fn assert_error<E: std::error::Error>() {}
        assert_error::<SnapshotError>();
    }
}
