//! Per-entity component record discriminants.

use crate::error::{SnapshotError, SnapshotResult};

/// Leading byte of every component record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SkipReason {
    /// The component payload follows.
    NoSkip = 0,
    /// Unchanged since the receiver last saw it; no payload.
    Delta = 1,
    /// The entity does not have the component; no payload.
    NoComponent = 2,
}

impl SkipReason {
    pub fn parse(raw: u8) -> SnapshotResult<Self> {
        match raw {
            0 => Ok(Self::NoSkip),
            1 => Ok(Self::Delta),
            2 => Ok(Self::NoComponent),
            _ => Err(SnapshotError::InvalidDiscriminant { value: raw }),
        }
    }

    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }
}

/// Number of records of each kind in one streamer slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecordCounts {
    pub present: usize,
    pub delta: usize,
    pub absent: usize,
}

impl RecordCounts {
    pub fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::NoSkip => self.present += 1,
            SkipReason::Delta => self.delta += 1,
            SkipReason::NoComponent => self.absent += 1,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.present + self.delta + self.absent
    }

    pub fn merge(&mut self, other: Self) {
        self.present += other.present;
        self.delta += other.delta;
        self.absent += other.absent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminant_values() {
        assert_eq!(SkipReason::NoSkip.raw(), 0);
        assert_eq!(SkipReason::Delta.raw(), 1);
        assert_eq!(SkipReason::NoComponent.raw(), 2);
    }

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!(SkipReason::parse(1).unwrap(), SkipReason::Delta);
        assert_eq!(
            SkipReason::parse(3),
            Err(SnapshotError::InvalidDiscriminant { value: 3 })
        );
    }

    #[test]
    fn counts_merge() {
        let mut a = RecordCounts::default();
        a.record(SkipReason::NoSkip);
        a.record(SkipReason::Delta);
        let mut b = RecordCounts::default();
        b.record(SkipReason::NoComponent);
        a.merge(b);
        assert_eq!(a.total(), 3);
        assert_eq!(a.absent, 1);
    }
}
