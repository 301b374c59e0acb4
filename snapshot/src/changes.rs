//! Per-entity dirty tracking.

use bevy_ecs::prelude::{Component, Entity, With, Without, World};

use crate::component::SnapshotComponent;

/// Change record for component `T` on one entity.
///
/// `is_dirty` is set by [`track_changes`] whenever the value differs from the
/// one observed on the previous pass. Entities without a record are treated
/// as dirty.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct DataChanged<T: SnapshotComponent> {
    pub is_dirty: bool,
    pub previous: T,
}

impl<T: SnapshotComponent> DataChanged<T> {
    #[must_use]
    pub const fn dirty(value: T) -> Self {
        Self {
            is_dirty: true,
            previous: value,
        }
    }

    #[must_use]
    pub const fn clean(value: T) -> Self {
        Self {
            is_dirty: false,
            previous: value,
        }
    }
}

/// Compares every `T` with its last observed value and refreshes `DataChanged<T>`.
///
/// New components get a dirty record; records whose entity lost `T` are removed.
pub fn track_changes<T: SnapshotComponent>(world: &mut World) {
    let observed: Vec<(Entity, DataChanged<T>)> = {
        let mut query = world.query::<(Entity, &T, Option<&DataChanged<T>>)>();
        query
            .iter(world)
            .filter_map(|(entity, value, changed)| match changed {
                None => Some((entity, DataChanged::dirty(*value))),
                Some(changed) => {
                    let is_dirty = changed.previous != *value;
                    // Skip the write when nothing moves so bevy change ticks stay quiet.
                    if !is_dirty && !changed.is_dirty {
                        None
                    } else {
                        Some((
                            entity,
                            DataChanged {
                                is_dirty,
                                previous: *value,
                            },
                        ))
                    }
                }
            })
            .collect()
    };
    for (entity, record) in observed {
        if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
            entity_mut.insert(record);
        }
    }

    let orphans: Vec<Entity> = world
        .query_filtered::<Entity, (With<DataChanged<T>>, Without<T>)>()
        .iter(world)
        .collect();
    for entity in orphans {
        if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
            entity_mut.remove::<DataChanged<T>>();
        }
    }
}

/// Forces the next delta to carry `T` for `entity`.
///
/// Returns `false` if the entity does not have `T`.
pub fn mark_dirty<T: SnapshotComponent>(world: &mut World, entity: Entity) -> bool {
    let Ok(mut entity_mut) = world.get_entity_mut(entity) else {
        return false;
    };
    let Some(value) = entity_mut.get::<T>().copied() else {
        return false;
    };
    entity_mut.insert(DataChanged::dirty(value));
    true
}

/// Returns whether `T` on `entity` must be sent in a delta.
#[must_use]
pub fn is_dirty<T: SnapshotComponent>(world: &World, entity: Entity) -> bool {
    world
        .get::<DataChanged<T>>(entity)
        .map_or(true, |changed| changed.is_dirty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Position;

    #[test]
    fn first_observation_is_dirty() {
        let mut world = World::new();
        let entity = world.spawn(Position::new(1.0, 2.0, 3.0)).id();
        assert!(is_dirty::<Position>(&world, entity));
        track_changes::<Position>(&mut world);
        let record = world.get::<DataChanged<Position>>(entity).unwrap();
        assert!(record.is_dirty);
        assert_eq!(record.previous, Position::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn unchanged_value_clears_dirty() {
        let mut world = World::new();
        let entity = world.spawn(Position::new(1.0, 2.0, 3.0)).id();
        track_changes::<Position>(&mut world);
        track_changes::<Position>(&mut world);
        assert!(!is_dirty::<Position>(&world, entity));
    }

    #[test]
    fn changed_value_sets_dirty_once() {
        let mut world = World::new();
        let entity = world.spawn(Position::new(0.0, 0.0, 0.0)).id();
        track_changes::<Position>(&mut world);
        track_changes::<Position>(&mut world);

        world.entity_mut(entity).insert(Position::new(0.0, 1.0, 0.0));
        track_changes::<Position>(&mut world);
        assert!(is_dirty::<Position>(&world, entity));

        track_changes::<Position>(&mut world);
        assert!(!is_dirty::<Position>(&world, entity));
    }

    #[test]
    fn orphaned_records_removed() {
        let mut world = World::new();
        let entity = world.spawn(Position::default()).id();
        track_changes::<Position>(&mut world);
        world.entity_mut(entity).remove::<Position>();
        track_changes::<Position>(&mut world);
        assert!(world.get::<DataChanged<Position>>(entity).is_none());
    }

    #[test]
    fn mark_dirty_forces_send() {
        let mut world = World::new();
        let entity = world.spawn(Position::default()).id();
        let bare = world.spawn_empty().id();
        track_changes::<Position>(&mut world);
        track_changes::<Position>(&mut world);
        assert!(!is_dirty::<Position>(&world, entity));

        assert!(mark_dirty::<Position>(&mut world, entity));
        assert!(is_dirty::<Position>(&world, entity));
        assert!(!mark_dirty::<Position>(&mut world, bare));
    }
}
