use std::collections::HashMap;

use bevy_ecs::prelude::Entity;

use crate::types::EntityRef;

/// Bidirectional table between snapshot entities and world entities.
///
/// Rebuilt for every generation and application; lookups that miss return
/// `None`, which is a normal condition during partial application.
#[derive(Debug, Default, Clone)]
pub struct EntityMap {
    to_world: HashMap<EntityRef, Entity>,
    to_snapshot: HashMap<Entity, EntityRef>,
}

impl EntityMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            to_world: HashMap::with_capacity(capacity),
            to_snapshot: HashMap::with_capacity(capacity),
        }
    }

    /// Links a snapshot entity to a world entity, replacing older links of either.
    pub fn insert(&mut self, snapshot: EntityRef, world: Entity) {
        if let Some(old_world) = self.to_world.insert(snapshot, world) {
            self.to_snapshot.remove(&old_world);
        }
        if let Some(old_snapshot) = self.to_snapshot.insert(world, snapshot) {
            if old_snapshot != snapshot {
                self.to_world.remove(&old_snapshot);
            }
        }
    }

    #[must_use]
    pub fn to_world(&self, snapshot: EntityRef) -> Option<Entity> {
        self.to_world.get(&snapshot).copied()
    }

    #[must_use]
    pub fn to_snapshot(&self, world: Entity) -> Option<EntityRef> {
        self.to_snapshot.get(&world).copied()
    }

    pub fn remove_snapshot(&mut self, snapshot: EntityRef) -> Option<Entity> {
        let world = self.to_world.remove(&snapshot)?;
        self.to_snapshot.remove(&world);
        Some(world)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityRef, Entity)> + '_ {
        self.to_world.iter().map(|(snapshot, world)| (*snapshot, *world))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.to_world.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_world.is_empty()
    }

    pub fn clear(&mut self) {
        self.to_world.clear();
        self.to_snapshot.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(index: u32) -> Entity {
        Entity::from_bits(u64::from(index))
    }

    #[test]
    fn lookups_both_ways() {
        let mut map = EntityMap::new();
        map.insert(EntityRef::new(5, 2), entity(1));
        assert_eq!(map.to_world(EntityRef::new(5, 2)), Some(entity(1)));
        assert_eq!(map.to_snapshot(entity(1)), Some(EntityRef::new(5, 2)));
        assert_eq!(map.to_world(EntityRef::new(5, 3)), None);
        assert_eq!(map.to_snapshot(entity(2)), None);
    }

    #[test]
    fn relinking_drops_stale_entries() {
        let mut map = EntityMap::new();
        map.insert(EntityRef::new(1, 0), entity(10));
        map.insert(EntityRef::new(1, 0), entity(11));
        assert_eq!(map.len(), 1);
        assert_eq!(map.to_snapshot(entity(10)), None);

        map.insert(EntityRef::new(2, 0), entity(11));
        assert_eq!(map.len(), 1);
        assert_eq!(map.to_world(EntityRef::new(1, 0)), None);
        assert_eq!(map.to_world(EntityRef::new(2, 0)), Some(entity(11)));
    }

    #[test]
    fn remove_and_clear() {
        let mut map = EntityMap::with_capacity(4);
        map.insert(EntityRef::new(1, 0), entity(1));
        map.insert(EntityRef::new(2, 0), entity(2));
        assert_eq!(map.remove_snapshot(EntityRef::new(1, 0)), Some(entity(1)));
        assert_eq!(map.to_snapshot(entity(1)), None);
        map.clear();
        assert!(map.is_empty());
    }
}
