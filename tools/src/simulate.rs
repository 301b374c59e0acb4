use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use bevy_ecs::prelude::{Entity, World};
use log::debug;
use serde::Serialize;
use snapshot::transform::{register_transform_streamers, Position, Rotation, Velocity};
use snapshot::{
    ConnectionId, GenerateSnapshot, GenerationMetrics, LoopbackTransport, MetricsSink,
    SnapshotConfig, SnapshotNetwork, SnapshotStats, SnapshotTick,
};
use wire::decode_frame;

const SERVER: ConnectionId = ConnectionId::new(0);
const CLIENT: ConnectionId = ConnectionId::new(1);
const WORLD_EXTENT: f32 = 500.0;

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub entities: usize,
    pub ticks: u32,
    /// RNG seed for deterministic runs.
    pub seed: u64,
    /// Chance, in percent, that an entity moves on a given tick.
    pub move_percent: u32,
    pub snapshot: SnapshotConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            entities: 64,
            ticks: 300,
            seed: 1,
            move_percent: 25,
            snapshot: SnapshotConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationSummary {
    pub entities: usize,
    pub ticks: u32,
    pub frames: u64,
    pub full_frames: u64,
    pub compressed_frames: u64,
    pub raw_bytes_total: u64,
    pub wire_bytes_total: u64,
    /// Client replicas whose position differed from the server after a tick.
    pub mismatches: u64,
    /// Slices the client reported as incoherent, failed or unknown.
    pub slice_errors: u64,
    pub server: SnapshotStats,
    pub client: SnapshotStats,
}

/// Logs every generated snapshot at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMetrics;

impl MetricsSink for LogMetrics {
    fn record_generation(&mut self, metrics: GenerationMetrics) {
        debug!(
            "tick {} -> connection {}: {} raw, {} on wire{}, {:?}",
            metrics.tick.raw(),
            metrics.connection.raw(),
            metrics.raw_bytes,
            metrics.wire_bytes,
            if metrics.compressed { " (lz4)" } else { "" },
            metrics.generation_time
        );
    }
}

/// Runs a server and a client world over the loopback transport.
///
/// Each tick moves a random subset of entities on the server, sends one
/// snapshot and applies it on the client. When `dump_dir` is set every frame
/// is written there as `tick_NNNNNN.bin`.
pub fn run_simulation(
    config: &SimulationConfig,
    dump_dir: Option<&Path>,
) -> Result<SimulationSummary> {
    if let Some(dir) = dump_dir {
        fs::create_dir_all(dir).with_context(|| format!("create dump dir {}", dir.display()))?;
    }

    let mut server = network(&config.snapshot)?;
    let mut client = network(&config.snapshot)?;
    server.set_metrics_sink(Box::new(LogMetrics));
    server.connect(CLIENT);
    client.connect(SERVER);
    let announcement = server.announce_patterns().context("announce server patterns")?;
    client
        .handle_announcement(SERVER, &announcement)
        .context("handle server announcement")?;

    let mut rng = Rng::new(config.seed);
    let mut server_world = World::new();
    let mut client_world = World::new();
    let entities = spawn_entities(&mut server_world, config.entities, &mut rng);
    let mut transport = LoopbackTransport::new();

    let mut summary = SimulationSummary {
        entities: config.entities,
        ticks: config.ticks,
        ..SimulationSummary::default()
    };

    for tick in 1..=config.ticks {
        step_entities(&mut server_world, &entities, &mut rng, config.move_percent);
        server
            .send_client_snapshots(&mut server_world, &mut transport, SnapshotTick::new(tick))
            .with_context(|| format!("send snapshots at tick {tick}"))?;

        for packet in transport.drain() {
            let frame = decode_frame(&packet.payload, &config.snapshot.wire_limits)
                .with_context(|| format!("decode frame at tick {tick}"))?;
            summary.frames += 1;
            summary.full_frames += u64::from(frame.header.flags.is_full_data());
            summary.compressed_frames += u64::from(frame.header.is_compressed);
            summary.raw_bytes_total += frame.header.payload_len() as u64;
            summary.wire_bytes_total += packet.payload.len() as u64;
            if let Some(dir) = dump_dir {
                let path = dir.join(format!("tick_{tick:06}.bin"));
                fs::write(&path, &packet.payload)
                    .with_context(|| format!("write {}", path.display()))?;
            }
            client
                .receive(SERVER, &packet.payload)
                .with_context(|| format!("receive frame at tick {tick}"))?;
        }

        for (_, report) in client.apply_pending(&mut client_world) {
            summary.slice_errors += report
                .slices
                .iter()
                .filter(|slice| !matches!(slice.outcome, snapshot::SliceOutcome::Applied(_)))
                .count() as u64;
        }
        summary.mismatches += count_mismatches(&server_world, &client_world, &client, &entities);
    }

    summary.server = server.stats().clone();
    summary.client = client.stats().clone();
    Ok(summary)
}

fn network(config: &SnapshotConfig) -> Result<SnapshotNetwork> {
    let mut network = SnapshotNetwork::new(config.clone()).context("create snapshot network")?;
    register_transform_streamers(network.manager_mut()).context("register streamers")?;
    Ok(network)
}

fn spawn_entities(world: &mut World, count: usize, rng: &mut Rng) -> Vec<Entity> {
    (0..count)
        .map(|_| {
            let position = Position::new(rng.coord(), rng.coord(), 0.0);
            let velocity = Velocity {
                linear: [rng.speed(), rng.speed(), 0.0],
                angular: [0.0; 3],
            };
            world
                .spawn((GenerateSnapshot, position, velocity, Rotation::IDENTITY))
                .id()
        })
        .collect()
}

fn step_entities(world: &mut World, entities: &[Entity], rng: &mut Rng, move_percent: u32) {
    for &entity in entities {
        if rng.next_u32() % 100 >= move_percent {
            continue;
        }
        let Some(velocity) = world.get::<Velocity>(entity).copied() else {
            continue;
        };
        if let Some(mut position) = world.get_mut::<Position>(entity) {
            position.x = (position.x + velocity.linear[0]).clamp(-WORLD_EXTENT, WORLD_EXTENT);
            position.y = (position.y + velocity.linear[1]).clamp(-WORLD_EXTENT, WORLD_EXTENT);
        }
    }
}

fn count_mismatches(
    server_world: &World,
    client_world: &World,
    client: &SnapshotNetwork,
    entities: &[Entity],
) -> u64 {
    let runtime = client.client(SERVER).and_then(|state| state.runtime());
    let mut mismatches = 0;
    for (index, entity) in entities.iter().enumerate() {
        let replica = runtime.and_then(|runtime| runtime.world_entity(index));
        let expected = server_world.get::<Position>(*entity);
        let actual = replica.and_then(|replica| client_world.get::<Position>(replica));
        if expected != actual {
            mismatches += 1;
        }
    }
    mismatches
}

/// Small deterministic LCG.
struct Rng {
    state: u64,
}

impl Rng {
    const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1);
        (self.state >> 32) as u32
    }

    #[allow(clippy::cast_precision_loss)]
    fn coord(&mut self) -> f32 {
        (self.next_u32() % 800) as f32 - 400.0
    }

    #[allow(clippy::cast_precision_loss)]
    fn speed(&mut self) -> f32 {
        ((self.next_u32() % 21) as f32 - 10.0) / 4.0
    }
}
