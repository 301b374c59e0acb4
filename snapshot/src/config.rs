//! Snapshot limits and network configuration.

use crate::transport::Delivery;

/// Limits enforced while generating and applying snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SnapshotLimits {
    /// Maximum entities in one snapshot.
    pub max_entities: usize,
    /// Maximum streamer slices in one snapshot.
    pub max_streamers: usize,
    /// Maximum uncompressed snapshot payload in bytes.
    pub max_snapshot_bytes: usize,
}

impl Default for SnapshotLimits {
    fn default() -> Self {
        Self {
            max_entities: 16 * 1024,
            max_streamers: 256,
            max_snapshot_bytes: 1024 * 1024,
        }
    }
}

impl SnapshotLimits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_entities: 256,
            max_streamers: 16,
            max_snapshot_bytes: 16 * 1024,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_entities: usize::MAX,
            max_streamers: usize::MAX,
            max_snapshot_bytes: usize::MAX,
        }
    }
}

/// Configuration of a [`SnapshotNetwork`](crate::SnapshotNetwork).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SnapshotConfig {
    /// Payloads strictly larger than this are LZ4-compressed.
    pub compression_threshold: usize,
    pub delivery: Delivery,
    pub channel: u8,
    /// Weight of the newest sample in telemetry averages.
    pub smoothing: f32,
    /// Send every snapshot as a full snapshot.
    pub always_full: bool,
    pub limits: SnapshotLimits,
    #[cfg_attr(feature = "serde", serde(skip, default))]
    pub wire_limits: wire::Limits,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            compression_threshold: wire::DEFAULT_COMPRESSION_THRESHOLD,
            delivery: Delivery::RELIABLE,
            channel: 0,
            smoothing: 0.5,
            always_full: false,
            limits: SnapshotLimits::default(),
            wire_limits: wire::Limits::default(),
        }
    }
}

impl SnapshotConfig {
    /// Small limits for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            limits: SnapshotLimits::for_testing(),
            wire_limits: wire::Limits::for_testing(),
            ..Self::default()
        }
    }
}
