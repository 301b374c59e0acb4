//! Diagnostics-only snapshot telemetry.

use std::time::Duration;

use crate::types::{ConnectionId, SnapshotTick};

/// Exponential moving average: `avg = avg + (sample - avg) * factor`.
///
/// The first sample initializes the average.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ema {
    factor: f32,
    value: Option<f32>,
}

impl Default for Ema {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl Ema {
    /// `factor` is clamped to `[0, 1]`.
    #[must_use]
    pub fn new(factor: f32) -> Self {
        Self {
            factor: factor.clamp(0.0, 1.0),
            value: None,
        }
    }

    pub fn push(&mut self, sample: f32) {
        self.value = Some(match self.value {
            None => sample,
            Some(avg) => avg + (sample - avg) * self.factor,
        });
    }

    #[must_use]
    pub fn value(&self) -> f32 {
        self.value.unwrap_or(0.0)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.value.is_none()
    }
}

/// Aggregate statistics of a [`SnapshotNetwork`](crate::SnapshotNetwork).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SnapshotStats {
    /// Average uncompressed snapshot size in bytes.
    pub snapshot_size: Ema,
    /// Average size on the wire in bytes, header included.
    pub compressed_size: Ema,
    pub snapshots_sent: u64,
    pub snapshots_received: u64,
    /// Packets applied during the last `apply_pending` call.
    pub received_this_frame: usize,
    /// Packets waiting to be applied.
    pub queue_len: usize,
    /// Packets dropped because they could not be decoded or applied.
    pub dropped: u64,
}

impl SnapshotStats {
    #[must_use]
    pub fn new(smoothing: f32) -> Self {
        Self {
            snapshot_size: Ema::new(smoothing),
            compressed_size: Ema::new(smoothing),
            ..Self::default()
        }
    }
}

/// Measurements for one generated and sent snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationMetrics {
    pub connection: ConnectionId,
    pub tick: SnapshotTick,
    pub full: bool,
    pub raw_bytes: usize,
    pub wire_bytes: usize,
    pub compressed: bool,
    pub generation_time: Duration,
}

pub trait MetricsSink {
    fn record_generation(&mut self, metrics: GenerationMetrics);
}
