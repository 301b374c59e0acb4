//! Snapshot generation and application.

use bevy_ecs::prelude::{Entity, World};
use buffer::{ByteReader, ByteWriter};
use log::{debug, trace, warn};
use pattern::{PatternBank, PatternExchange, PatternId, SNAPSHOT_PATTERN};
use wire::SnapshotFlags;

use crate::component::SnapshotComponent;
use crate::config::SnapshotLimits;
use crate::error::{SnapshotError, SnapshotLimitKind, SnapshotResult};
use crate::layout::{
    count_field, read_count, read_entity_list, read_slice_header, write_entity_list, SliceHeader,
};
use crate::record::RecordCounts;
use crate::registry::StreamerRegistry;
use crate::replicate::ReplicatedFrom;
use crate::runtime::{RuntimeHeader, SnapshotRuntime};
use crate::streamer::{ComponentStreamer, Streamer};
use crate::types::{SnapshotReceiver, SnapshotSender, SnapshotTick};

/// One generated snapshot for one receiver.
#[derive(Debug, Clone)]
pub struct SnapshotGeneration {
    pub tick: SnapshotTick,
    pub receiver: SnapshotReceiver,
    pub flags: SnapshotFlags,
    /// Uncompressed payload.
    pub data: Vec<u8>,
    pub runtime: SnapshotRuntime,
    pub counts: RecordCounts,
}

/// What happened to one streamer slice during application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SliceOutcome {
    Applied(RecordCounts),
    /// Applied, but the streamer's cursor did not land on the declared end.
    Incoherent {
        expected: usize,
        actual: usize,
        counts: RecordCounts,
    },
    /// The slice could not be read; its effect was discarded.
    Failed(SnapshotError),
    /// No local streamer matches the slice's pattern id; skipped.
    UnknownPattern,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceReport {
    /// Pattern id as sent by the peer.
    pub pattern_id: PatternId,
    pub outcome: SliceOutcome,
}

/// Summary of one application pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub entity_count: usize,
    pub spawned: usize,
    pub despawned: usize,
    pub slices: Vec<SliceReport>,
    /// Set when a slice header was unreadable and the remaining slices were skipped.
    pub aborted: Option<SnapshotError>,
}

impl ApplyReport {
    /// Returns true if every slice applied cleanly.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.aborted.is_none()
            && self
                .slices
                .iter()
                .all(|slice| matches!(slice.outcome, SliceOutcome::Applied(_)))
    }
}

/// Owns the streamer set and drives generation and application passes.
pub struct SnapshotManager {
    registry: StreamerRegistry,
    bank: PatternBank,
    snapshot_pattern: PatternId,
    limits: SnapshotLimits,
}

impl SnapshotManager {
    /// Creates a manager whose bank starts with the snapshot message pattern.
    pub fn new(limits: SnapshotLimits) -> SnapshotResult<Self> {
        let mut bank = PatternBank::new();
        let snapshot_pattern = bank.register(SNAPSHOT_PATTERN)?;
        Ok(Self {
            registry: StreamerRegistry::new(),
            bank,
            snapshot_pattern,
            limits,
        })
    }

    #[must_use]
    pub const fn limits(&self) -> &SnapshotLimits {
        &self.limits
    }

    #[must_use]
    pub const fn bank(&self) -> &PatternBank {
        &self.bank
    }

    #[must_use]
    pub const fn registry(&self) -> &StreamerRegistry {
        &self.registry
    }

    /// Local id of the snapshot message pattern.
    #[must_use]
    pub const fn snapshot_pattern(&self) -> PatternId {
        self.snapshot_pattern
    }

    /// Registers a [`ComponentStreamer`] for `T`.
    pub fn register_component<T: SnapshotComponent>(&mut self) -> SnapshotResult<PatternId> {
        self.register(Box::new(ComponentStreamer::<T>::new()))
    }

    /// Registers a streamer; it is appended to the slice order.
    pub fn register(&mut self, streamer: Box<dyn Streamer>) -> SnapshotResult<PatternId> {
        if self.registry.len() >= self.limits.max_streamers {
            return Err(SnapshotError::LimitsExceeded {
                kind: SnapshotLimitKind::Streamers,
                limit: self.limits.max_streamers,
                actual: self.registry.len() + 1,
            });
        }
        if self.registry.find(streamer.pattern()).is_some() {
            return Err(SnapshotError::DuplicatePattern {
                pattern: streamer.pattern().to_owned(),
            });
        }
        let id = self.bank.register(streamer.pattern())?;
        self.registry.register(streamer)?;
        Ok(id)
    }

    /// Removes a streamer. Its pattern id stays reserved in the bank.
    pub fn unregister(&mut self, pattern: &str) -> bool {
        self.registry.unregister(pattern).is_some()
    }

    /// Runs every streamer's change-detection pass.
    pub fn detect_changes(&mut self, world: &mut World) {
        for streamer in self.registry.iter_mut() {
            streamer.detect_changes(world);
        }
    }

    /// Generates the payload of one snapshot of `entities` for `receiver`.
    ///
    /// The snapshot is full when `full` is set or the receiver asks for one.
    pub fn generate_for_connection(
        &mut self,
        world: &World,
        receiver: &SnapshotReceiver,
        entities: &[Entity],
        full: bool,
        tick: SnapshotTick,
    ) -> SnapshotResult<SnapshotGeneration> {
        if entities.len() > self.limits.max_entities {
            return Err(SnapshotError::LimitsExceeded {
                kind: SnapshotLimitKind::Entities,
                limit: self.limits.max_entities,
                actual: entities.len(),
            });
        }
        for streamer in self.registry.iter_mut() {
            streamer.subscribe(world);
        }

        let full = full || receiver.want_full_snapshot;
        let receiver = SnapshotReceiver {
            want_full_snapshot: full,
            ..*receiver
        };
        let flags = if full {
            SnapshotFlags::full_data()
        } else {
            SnapshotFlags::delta()
        };
        let runtime = SnapshotRuntime::for_generation(RuntimeHeader { tick, flags }, entities);

        let mut writer = ByteWriter::with_limit(self.limits.max_snapshot_bytes);
        write_entity_list(&mut writer, runtime.snapshot_entities())?;
        writer.write(count_field(
            self.registry.len(),
            SnapshotLimitKind::Streamers,
        )?)?;

        let mut counts = RecordCounts::default();
        for streamer in self.registry.iter() {
            let pattern_id =
                self.bank
                    .id_of(streamer.pattern())
                    .ok_or_else(|| SnapshotError::UnregisteredPattern {
                        pattern: streamer.pattern().to_owned(),
                    })?;
            let end = writer.create_marker::<i32>()?;
            writer.write(pattern_id.raw())?;
            counts.merge(streamer.write_data(&receiver, &runtime, world, &mut writer)?);
            let offset = count_field(writer.len(), SnapshotLimitKind::SnapshotBytes)?;
            writer.patch(end, offset)?;
        }

        debug!(
            "generated {} snapshot for connection {} at tick {}: {} entities, {} bytes",
            if full { "full" } else { "delta" },
            receiver.connection.raw(),
            tick.raw(),
            runtime.entity_count(),
            writer.len()
        );
        Ok(SnapshotGeneration {
            tick,
            receiver,
            flags,
            data: writer.finish(),
            runtime,
            counts,
        })
    }

    /// Applies a snapshot payload from `sender` to `world`.
    ///
    /// Entities known to `previous` are reused, unknown ones are spawned with
    /// [`ReplicatedFrom`], and replicated entities missing from the new list are
    /// despawned. Slice failures are logged and reported without failing the pass;
    /// only an unreadable entity list or streamer count returns an error, in
    /// which case the world is untouched.
    pub fn apply_snapshot_from_data(
        &self,
        world: &mut World,
        sender: &SnapshotSender,
        data: &[u8],
        previous: Option<&SnapshotRuntime>,
        exchange: &PatternExchange,
    ) -> SnapshotResult<(SnapshotRuntime, ApplyReport)> {
        if data.len() > self.limits.max_snapshot_bytes {
            return Err(SnapshotError::LimitsExceeded {
                kind: SnapshotLimitKind::SnapshotBytes,
                limit: self.limits.max_snapshot_bytes,
                actual: data.len(),
            });
        }
        let mut reader = ByteReader::new(data);
        let entities = read_entity_list(&mut reader, &self.limits)?;
        let streamer_count = read_count(
            &mut reader,
            "streamer",
            SnapshotLimitKind::Streamers,
            self.limits.max_streamers,
        )?;

        let tick = previous.map_or(SnapshotTick::new(1), |previous| {
            SnapshotTick::new(previous.header.tick.raw().wrapping_add(1))
        });
        let header = RuntimeHeader {
            tick,
            flags: sender.flags,
        };
        let mut runtime = SnapshotRuntime::for_application(header, entities.len());
        let mut report = ApplyReport {
            entity_count: entities.len(),
            ..ApplyReport::default()
        };

        for snapshot_entity in entities {
            let reused = previous
                .and_then(|previous| previous.entity_to_world(snapshot_entity))
                .filter(|entity| world.get_entity(*entity).is_ok());
            let entity = if let Some(entity) = reused {
                entity
            } else {
                report.spawned += 1;
                world.spawn(ReplicatedFrom(snapshot_entity)).id()
            };
            runtime.push(snapshot_entity, Some(entity));
        }

        if let Some(previous) = previous {
            for (snapshot_entity, entity) in previous.map().iter() {
                if runtime.entity_to_world(snapshot_entity).is_none()
                    && world.get::<ReplicatedFrom>(entity).is_some()
                {
                    world.despawn(entity);
                    report.despawned += 1;
                }
            }
        }

        for _ in 0..streamer_count {
            let header = match read_slice_header(&mut reader) {
                Ok(header) => header,
                Err(err) => {
                    warn!(
                        "aborting snapshot from connection {}: {err}",
                        sender.connection.raw()
                    );
                    report.aborted = Some(err);
                    break;
                }
            };
            let outcome = self.apply_slice(world, sender, &runtime, data, header, exchange);
            report.slices.push(SliceReport {
                pattern_id: header.pattern_id,
                outcome,
            });
            // The declared end is authoritative for the next slice.
            reader.seek(header.end)?;
        }

        Ok((runtime, report))
    }

    fn apply_slice(
        &self,
        world: &mut World,
        sender: &SnapshotSender,
        runtime: &SnapshotRuntime,
        data: &[u8],
        header: SliceHeader,
        exchange: &PatternExchange,
    ) -> SliceOutcome {
        let streamer = exchange
            .origin_id(header.pattern_id)
            .and_then(|local| self.bank.name_of(local))
            .and_then(|name| self.registry.find(name));
        let Some(streamer) = streamer else {
            debug!(
                "skipping slice with unknown pattern id {} from connection {}",
                header.pattern_id.raw(),
                sender.connection.raw()
            );
            return SliceOutcome::UnknownPattern;
        };

        let mut reader = ByteReader::new(data);
        if let Err(err) = reader.seek(header.body_start) {
            return SliceOutcome::Failed(err.into());
        }
        match streamer.read_data(sender, runtime, world, &mut reader) {
            Err(err) => {
                warn!(
                    "discarding slice '{}' from connection {}: {err}",
                    streamer.pattern(),
                    sender.connection.raw()
                );
                SliceOutcome::Failed(err)
            }
            Ok(counts) if reader.position() != header.end => {
                warn!(
                    "incoherent slice '{}' from connection {}: read ended at {}, declared end {}",
                    streamer.pattern(),
                    sender.connection.raw(),
                    reader.position(),
                    header.end
                );
                SliceOutcome::Incoherent {
                    expected: header.end,
                    actual: reader.position(),
                    counts,
                }
            }
            Ok(counts) => {
                trace!(
                    "applied slice '{}': {} present, {} delta, {} absent",
                    streamer.pattern(),
                    counts.present,
                    counts.delta,
                    counts.absent
                );
                SliceOutcome::Applied(counts)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{register_transform_streamers, Position};
    use crate::types::ConnectionId;

    #[test]
    fn snapshot_pattern_is_first() {
        let manager = SnapshotManager::new(SnapshotLimits::default()).unwrap();
        assert_eq!(manager.snapshot_pattern(), PatternId::new(1));
        assert_eq!(manager.bank().name_of(PatternId::new(1)), Some(SNAPSHOT_PATTERN));
    }

    #[test]
    fn duplicate_component_rejected() {
        let mut manager = SnapshotManager::new(SnapshotLimits::default()).unwrap();
        manager.register_component::<Position>().unwrap();
        assert!(matches!(
            manager.register_component::<Position>(),
            Err(SnapshotError::DuplicatePattern { .. })
        ));
    }

    #[test]
    fn streamer_limit_enforced() {
        let limits = SnapshotLimits {
            max_streamers: 2,
            ..SnapshotLimits::default()
        };
        let mut manager = SnapshotManager::new(limits).unwrap();
        let err = register_transform_streamers(&mut manager).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::LimitsExceeded {
                kind: SnapshotLimitKind::Streamers,
                ..
            }
        ));
    }

    #[test]
    fn unregister_keeps_bank_ids() {
        let mut manager = SnapshotManager::new(SnapshotLimits::default()).unwrap();
        let id = manager.register_component::<Position>().unwrap();
        assert!(manager.unregister("auto.transform.Position"));
        assert!(manager.registry().is_empty());
        assert_eq!(manager.register_component::<Position>().unwrap(), id);
    }

    #[test]
    fn entity_limit_enforced() {
        let mut manager = SnapshotManager::new(SnapshotLimits::for_testing()).unwrap();
        let world = World::new();
        let entities: Vec<Entity> = (0..300).map(Entity::from_bits).collect();
        let receiver = SnapshotReceiver::new(ConnectionId::new(1), true);
        let err = manager
            .generate_for_connection(&world, &receiver, &entities, true, SnapshotTick::new(1))
            .unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::LimitsExceeded {
                kind: SnapshotLimitKind::Entities,
                ..
            }
        ));
    }

    #[test]
    fn report_cleanliness() {
        let mut report = ApplyReport::default();
        assert!(report.is_clean());
        report.slices.push(SliceReport {
            pattern_id: PatternId::new(2),
            outcome: SliceOutcome::UnknownPattern,
        });
        assert!(!report.is_clean());
    }
}
