//! Transport seam used to send framed snapshots.

use crate::error::SnapshotResult;
use crate::types::ConnectionId;

/// Delivery guarantees requested for a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Delivery(u8);

impl Delivery {
    pub const UNRELIABLE: Self = Self(0);
    pub const RELIABLE: Self = Self(1 << 0);
    pub const UNSEQUENCED: Self = Self(1 << 1);

    /// Reliable and unsequenced.
    pub const RELIABLE_UNSEQUENCED: Self = Self(Self::RELIABLE.0 | Self::UNSEQUENCED.0);

    const VALID_MASK: u8 = Self::RELIABLE.0 | Self::UNSEQUENCED.0;

    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn is_reliable(self) -> bool {
        self.0 & Self::RELIABLE.0 != 0
    }

    #[must_use]
    pub const fn is_unsequenced(self) -> bool {
        self.0 & Self::UNSEQUENCED.0 != 0
    }

    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 & !Self::VALID_MASK == 0
    }
}

/// Send primitive the snapshot network hands framed packets to.
pub trait Transport {
    fn send(
        &mut self,
        connection: ConnectionId,
        payload: &[u8],
        channel: u8,
        delivery: Delivery,
    ) -> SnapshotResult<()>;
}

/// A packet recorded by [`LoopbackTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPacket {
    pub connection: ConnectionId,
    pub channel: u8,
    pub delivery: Delivery,
    pub payload: Vec<u8>,
}

/// In-memory transport that keeps every sent packet until drained.
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    sent: Vec<SentPacket>,
}

impl LoopbackTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sent(&self) -> &[SentPacket] {
        &self.sent
    }

    /// Takes all packets sent so far, in send order.
    pub fn drain(&mut self) -> Vec<SentPacket> {
        std::mem::take(&mut self.sent)
    }
}

impl Transport for LoopbackTransport {
    fn send(
        &mut self,
        connection: ConnectionId,
        payload: &[u8],
        channel: u8,
        delivery: Delivery,
    ) -> SnapshotResult<()> {
        self.sent.push(SentPacket {
            connection,
            channel,
            delivery,
            payload: payload.to_vec(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_flags() {
        assert!(!Delivery::UNRELIABLE.is_reliable());
        assert!(Delivery::RELIABLE.is_reliable());
        assert!(Delivery::RELIABLE_UNSEQUENCED.is_reliable());
        assert!(Delivery::RELIABLE_UNSEQUENCED.is_unsequenced());
        assert!(Delivery::RELIABLE_UNSEQUENCED.is_valid());
        assert!(!Delivery::from_raw(0x80).is_valid());
    }

    #[test]
    fn loopback_records_packets() {
        let mut transport = LoopbackTransport::new();
        transport
            .send(ConnectionId::new(2), &[1, 2], 3, Delivery::RELIABLE)
            .unwrap();
        assert_eq!(transport.sent().len(), 1);
        let drained = transport.drain();
        assert_eq!(drained[0].payload, vec![1, 2]);
        assert_eq!(drained[0].channel, 3);
        assert!(transport.sent().is_empty());
    }
}
