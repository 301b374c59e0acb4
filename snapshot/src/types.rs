//! Core types shared by generation and application.

use bevy_ecs::prelude::Entity;
use wire::SnapshotFlags;

/// A simulation tick number.
///
/// Ticks are monotonically increasing identifiers for simulation states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SnapshotTick(u32);

impl SnapshotTick {
    /// Creates a new snapshot tick.
    #[must_use]
    pub const fn new(tick: u32) -> Self {
        Self(tick)
    }

    /// Returns the raw tick value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for SnapshotTick {
    fn from(tick: u32) -> Self {
        Self(tick)
    }
}

impl From<SnapshotTick> for u32 {
    fn from(tick: SnapshotTick) -> Self {
        tick.0
    }
}

/// An entity identifier as it appears on the wire: `(index, version)`.
///
/// On the sending side this is derived from the world entity; on the
/// receiving side it only identifies the sender's entity and must be
/// translated through an [`EntityMap`](crate::EntityMap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityRef {
    pub index: i32,
    pub version: i32,
}

impl EntityRef {
    #[must_use]
    pub const fn new(index: i32, version: i32) -> Self {
        Self { index, version }
    }

    /// Wire identity of a world entity.
    #[must_use]
    pub fn from_entity(entity: Entity) -> Self {
        let bits = entity.to_bits();
        // Split the 64-bit identity into its low and high halves, bit for bit.
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let index = bits as u32 as i32;
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let version = (bits >> 32) as u32 as i32;
        Self { index, version }
    }
}

impl From<Entity> for EntityRef {
    fn from(entity: Entity) -> Self {
        Self::from_entity(entity)
    }
}

/// Identity of a connected peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConnectionId(u32);

impl ConnectionId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for ConnectionId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// The peer a snapshot is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotReceiver {
    pub connection: ConnectionId,
    /// Bypass dirty tracking and emit every record.
    pub want_full_snapshot: bool,
}

impl SnapshotReceiver {
    #[must_use]
    pub const fn new(connection: ConnectionId, want_full_snapshot: bool) -> Self {
        Self {
            connection,
            want_full_snapshot,
        }
    }
}

/// The peer a snapshot was received from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotSender {
    pub connection: ConnectionId,
    pub flags: SnapshotFlags,
}

impl SnapshotSender {
    #[must_use]
    pub const fn new(connection: ConnectionId, flags: SnapshotFlags) -> Self {
        Self { connection, flags }
    }
}
