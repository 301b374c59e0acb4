//! Property tests: a client that applies every delta tracks the server exactly.

use bevy_ecs::prelude::{Entity, World};
use pattern::PatternExchange;
use proptest::prelude::*;
use snapshot::transform::{register_transform_streamers, Position, Rotation};
use snapshot::{
    ConnectionId, GenerateSnapshot, SnapshotLimits, SnapshotManager, SnapshotReceiver,
    SnapshotRuntime, SnapshotSender, SnapshotTick,
};

#[derive(Debug, Clone)]
enum Edit {
    Move(f32),
    RemoveRotation,
    SetRotation(f32),
}

fn coord() -> impl Strategy<Value = f32> {
    (-100i16..100).prop_map(f32::from)
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        3 => coord().prop_map(Edit::Move),
        1 => Just(Edit::RemoveRotation),
        1 => coord().prop_map(Edit::SetRotation),
    ]
}

fn apply_edit(world: &mut World, entity: Entity, edit: &Edit) {
    match edit {
        Edit::Move(x) => {
            if let Some(mut position) = world.get_mut::<Position>(entity) {
                position.x = *x;
            }
        }
        Edit::RemoveRotation => {
            world.entity_mut(entity).remove::<Rotation>();
        }
        Edit::SetRotation(w) => {
            world
                .entity_mut(entity)
                .insert(Rotation::new(0.0, 0.0, 0.0, *w));
        }
    }
}

proptest! {
    #[test]
    fn client_matches_server_after_each_delta(
        entity_count in 1usize..8,
        ticks in prop::collection::vec(prop::collection::vec((0usize..8, edit()), 0..6), 1..10),
    ) {
        let mut manager = SnapshotManager::new(SnapshotLimits::for_testing()).unwrap();
        register_transform_streamers(&mut manager).unwrap();
        let exchange = PatternExchange::identity(manager.bank());

        let mut server = World::new();
        let entities: Vec<Entity> = (0..entity_count)
            .map(|_| server.spawn((GenerateSnapshot, Position::default())).id())
            .collect();

        let mut client = World::new();
        let mut previous: Option<SnapshotRuntime> = None;
        let receiver = SnapshotReceiver::new(ConnectionId::new(1), false);

        for (tick, edits) in ticks.iter().enumerate() {
            for (index, edit) in edits {
                apply_edit(&mut server, entities[index % entity_count], edit);
            }
            manager.detect_changes(&mut server);
            let generation = manager
                .generate_for_connection(
                    &server,
                    &receiver,
                    &entities,
                    tick == 0,
                    SnapshotTick::new(u32::try_from(tick).unwrap()),
                )
                .unwrap();
            let sender = SnapshotSender::new(ConnectionId::new(0), generation.flags);
            let (runtime, report) = manager
                .apply_snapshot_from_data(
                    &mut client,
                    &sender,
                    &generation.data,
                    previous.as_ref(),
                    &exchange,
                )
                .unwrap();
            prop_assert!(report.is_clean());

            for (index, entity) in entities.iter().enumerate() {
                let replica = runtime.world_entity(index).unwrap();
                prop_assert_eq!(server.get::<Position>(*entity), client.get::<Position>(replica));
                prop_assert_eq!(server.get::<Rotation>(*entity), client.get::<Rotation>(replica));
            }
            previous = Some(runtime);
        }
    }

    #[test]
    fn arbitrary_payloads_never_panic(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut manager = SnapshotManager::new(SnapshotLimits::for_testing()).unwrap();
        register_transform_streamers(&mut manager).unwrap();
        let exchange = PatternExchange::identity(manager.bank());
        let sender = SnapshotSender::new(ConnectionId::new(0), wire::SnapshotFlags::delta());
        let mut world = World::new();
        let _ = manager.apply_snapshot_from_data(&mut world, &sender, &data, None, &exchange);
    }
}
