//! Configurable limits for bounded decoding.

/// Wire-level limits for frame decoding.
///
/// Enforced before any allocation for decompression so a hostile length
/// field cannot force a large buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum size of a whole frame in bytes.
    pub max_frame_bytes: usize,

    /// Maximum declared uncompressed payload length.
    pub max_uncompressed_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_frame_bytes: 256 * 1024,
            max_uncompressed_bytes: 1024 * 1024,
        }
    }
}

impl Limits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_frame_bytes: 8192,
            max_uncompressed_bytes: 16 * 1024,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_frame_bytes: usize::MAX,
            max_uncompressed_bytes: usize::MAX,
        }
    }
}
