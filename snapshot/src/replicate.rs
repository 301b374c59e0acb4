//! Entity selection markers.

use bevy_ecs::prelude::{Component, Entity, With, World};

use crate::types::EntityRef;

/// Marks a world entity for inclusion in generated snapshots.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenerateSnapshot;

/// Added to entities spawned while applying a snapshot; holds the sender's id.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplicatedFrom(pub EntityRef);

/// Entities marked with [`GenerateSnapshot`], ordered by entity bits.
pub fn collect_replicated_entities(world: &mut World) -> Vec<Entity> {
    let mut entities: Vec<Entity> = world
        .query_filtered::<Entity, With<GenerateSnapshot>>()
        .iter(world)
        .collect();
    entities.sort_unstable_by_key(|entity| entity.to_bits());
    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_only_marked() {
        let mut world = World::new();
        let a = world.spawn(GenerateSnapshot).id();
        world.spawn_empty();
        let b = world.spawn(GenerateSnapshot).id();
        let entities = collect_replicated_entities(&mut world);
        assert_eq!(entities.len(), 2);
        assert!(entities.contains(&a));
        assert!(entities.contains(&b));
        assert!(entities[0].to_bits() < entities[1].to_bits());
    }
}
