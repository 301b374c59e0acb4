//! Snapshot replication for `bevy_ecs` worlds.
//!
//! A [`SnapshotManager`] owns an ordered set of [`Streamer`]s. Each generation
//! writes the entity list, then one length-framed slice per streamer holding a
//! one-byte [`SkipReason`] and an optional fixed-size payload per entity. The
//! receiver rebuilds the entity mapping, demultiplexes slices by pattern id and
//! applies them to its own world. [`SnapshotNetwork`] adds per-connection
//! state, LZ4 framing and a [`Transport`] seam on top.
//!
//! # Design Principles
//!
//! - **Slices are independent** - A corrupt slice is discarded; the declared end offset resynchronizes the rest.
//! - **Per-receiver deltas** - Clean values are skipped unless the receiver wants a full snapshot.
//! - **Decode before apply** - Streamers parse a whole slice before touching the world.
//! - **Bounded decoding** - Counts are checked against [`SnapshotLimits`] before allocating.
//!
//! # Example
//!
//! ```
//! use bevy_ecs::prelude::World;
//! use pattern::PatternExchange;
//! use snapshot::{
//!     transform::{register_transform_streamers, Position},
//!     ConnectionId, GenerateSnapshot, SnapshotLimits, SnapshotManager, SnapshotReceiver,
//!     SnapshotSender, SnapshotTick,
//! };
//!
//! let mut manager = SnapshotManager::new(SnapshotLimits::default()).unwrap();
//! register_transform_streamers(&mut manager).unwrap();
//!
//! let mut server = World::new();
//! let entity = server.spawn((GenerateSnapshot, Position::new(5.0, 2.0, 0.0))).id();
//! manager.detect_changes(&mut server);
//!
//! let receiver = SnapshotReceiver::new(ConnectionId::new(1), true);
//! let generation = manager
//!     .generate_for_connection(&server, &receiver, &[entity], true, SnapshotTick::new(1))
//!     .unwrap();
//!
//! let mut client = World::new();
//! let sender = SnapshotSender::new(ConnectionId::new(0), generation.flags);
//! let exchange = PatternExchange::identity(manager.bank());
//! let (runtime, report) = manager
//!     .apply_snapshot_from_data(&mut client, &sender, &generation.data, None, &exchange)
//!     .unwrap();
//! assert!(report.is_clean());
//!
//! let replica = runtime.world_entity(0).unwrap();
//! assert_eq!(client.get::<Position>(replica), Some(&Position::new(5.0, 2.0, 0.0)));
//! ```

mod changes;
mod component;
mod config;
mod error;
mod layout;
mod manager;
mod mapping;
mod network;
mod record;
mod registry;
mod replicate;
mod runtime;
mod streamer;
mod telemetry;
pub mod transform;
mod transport;
mod types;

pub use changes::{is_dirty, mark_dirty, track_changes, DataChanged};
pub use component::SnapshotComponent;
pub use config::{SnapshotConfig, SnapshotLimits};
pub use error::{SnapshotError, SnapshotLimitKind, SnapshotResult};
pub use layout::{
    parse_layout, read_count, read_entity_list, read_slice_header, write_entity_list,
    SliceHeader, SliceLayout, SnapshotLayout, ENTITY_REF_SIZE, SLICE_HEADER_SIZE,
};
pub use manager::{ApplyReport, SliceOutcome, SliceReport, SnapshotGeneration, SnapshotManager};
pub use mapping::EntityMap;
pub use network::{ClientSnapshotState, SnapshotNetwork};
pub use record::{RecordCounts, SkipReason};
pub use registry::StreamerRegistry;
pub use replicate::{collect_replicated_entities, GenerateSnapshot, ReplicatedFrom};
pub use runtime::{RuntimeHeader, SnapshotRuntime};
pub use streamer::{ComponentStreamer, Streamer};
pub use telemetry::{Ema, GenerationMetrics, MetricsSink, SnapshotStats};
pub use transport::{Delivery, LoopbackTransport, SentPacket, Transport};
pub use types::{ConnectionId, EntityRef, SnapshotReceiver, SnapshotSender, SnapshotTick};
