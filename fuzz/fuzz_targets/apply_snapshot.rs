#![no_main]

use bevy_ecs::prelude::World;
use libfuzzer_sys::fuzz_target;
use snapshot::transform::register_transform_streamers;
use snapshot::{ConnectionId, SnapshotConfig, SnapshotNetwork};

const PEER: ConnectionId = ConnectionId::new(0);

fuzz_target!(|data: &[u8]| {
    let Ok(mut network) = SnapshotNetwork::new(SnapshotConfig::for_testing()) else {
        return;
    };
    if register_transform_streamers(network.manager_mut()).is_err() {
        return;
    }
    network.connect(PEER);
    let mut world = World::new();

    // Split the input into length-prefixed frames so runtimes carry over.
    let mut idx = 0usize;
    while idx < data.len() && idx < 4096 {
        let len = (data[idx] as usize % 200).saturating_add(1);
        idx += 1;
        let end = (idx + len).min(data.len());
        let frame = &data[idx..end];
        idx = end;
        let _ = network.receive(PEER, frame);
        let _ = network.apply_pending(&mut world);
    }

    // The whole input as a raw payload, bypassing the frame header.
    let manager = network.manager();
    let exchange = pattern::PatternExchange::identity(manager.bank());
    let sender = snapshot::SnapshotSender::new(PEER, wire::SnapshotFlags::delta());
    let _ = manager.apply_snapshot_from_data(&mut world, &sender, data, None, &exchange);
});
