//! Per-pass snapshot runtime: entity list and mapping.

use bevy_ecs::prelude::Entity;
use wire::SnapshotFlags;

use crate::mapping::EntityMap;
use crate::types::{EntityRef, SnapshotTick};

/// Header data describing the pass a runtime belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuntimeHeader {
    pub tick: SnapshotTick,
    pub flags: SnapshotFlags,
}

/// Entity list and mapping for one generation or application pass.
///
/// `snapshot_entities[i]` and `world_entities[i]` describe the same entity;
/// on the receiving side a world slot is `None` only while the entity is
/// being created.
#[derive(Debug, Clone, Default)]
pub struct SnapshotRuntime {
    pub header: RuntimeHeader,
    snapshot_entities: Vec<EntityRef>,
    world_entities: Vec<Option<Entity>>,
    map: EntityMap,
}

impl SnapshotRuntime {
    /// Runtime for generating a snapshot of `entities`, where the wire id is the world id.
    #[must_use]
    pub fn for_generation(header: RuntimeHeader, entities: &[Entity]) -> Self {
        let mut runtime = Self {
            header,
            snapshot_entities: Vec::with_capacity(entities.len()),
            world_entities: Vec::with_capacity(entities.len()),
            map: EntityMap::with_capacity(entities.len()),
        };
        for entity in entities {
            runtime.push(EntityRef::from_entity(*entity), Some(*entity));
        }
        runtime
    }

    /// Empty runtime for an application pass.
    #[must_use]
    pub fn for_application(header: RuntimeHeader, capacity: usize) -> Self {
        Self {
            header,
            snapshot_entities: Vec::with_capacity(capacity),
            world_entities: Vec::with_capacity(capacity),
            map: EntityMap::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, snapshot: EntityRef, world: Option<Entity>) {
        self.snapshot_entities.push(snapshot);
        self.world_entities.push(world);
        if let Some(world) = world {
            self.map.insert(snapshot, world);
        }
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.snapshot_entities.len()
    }

    #[must_use]
    pub fn snapshot_entities(&self) -> &[EntityRef] {
        &self.snapshot_entities
    }

    #[must_use]
    pub fn snapshot_entity(&self, index: usize) -> Option<EntityRef> {
        self.snapshot_entities.get(index).copied()
    }

    /// World entity for the `index`-th snapshot entity.
    #[must_use]
    pub fn world_entity(&self, index: usize) -> Option<Entity> {
        self.world_entities.get(index).copied().flatten()
    }

    #[must_use]
    pub fn entity_to_world(&self, snapshot: EntityRef) -> Option<Entity> {
        self.map.to_world(snapshot)
    }

    #[must_use]
    pub fn world_to_snapshot(&self, world: Entity) -> Option<EntityRef> {
        self.map.to_snapshot(world)
    }

    #[must_use]
    pub const fn map(&self) -> &EntityMap {
        &self.map
    }

    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.header.flags.is_full_data()
    }
}
