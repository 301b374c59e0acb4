//! Per-component-type streamers.

use std::marker::PhantomData;

use bevy_ecs::component::ComponentId;
use bevy_ecs::prelude::World;
use buffer::{ByteReader, ByteWriter};

use crate::changes::{is_dirty, track_changes, DataChanged};
use crate::component::SnapshotComponent;
use crate::error::{SnapshotError, SnapshotResult};
use crate::record::{RecordCounts, SkipReason};
use crate::runtime::SnapshotRuntime;
use crate::types::{SnapshotReceiver, SnapshotSender};

/// The unit that writes and reads one replicated system's records.
///
/// A streamer emits exactly one record per entity of the runtime, in runtime
/// order, and reads back the same number of records.
pub trait Streamer: Send + Sync {
    /// Stable pattern name shared by both peers.
    fn pattern(&self) -> &str;

    /// Fixed payload size of a present record, if the streamer has one.
    fn payload_size(&self) -> Option<usize> {
        None
    }

    /// Refreshes cached world lookups. Called before every generation.
    fn subscribe(&mut self, world: &World);

    /// Runs the change-detection pass for this streamer's data.
    fn detect_changes(&mut self, world: &mut World);

    /// Appends one record per runtime entity.
    fn write_data(
        &self,
        receiver: &SnapshotReceiver,
        runtime: &SnapshotRuntime,
        world: &World,
        writer: &mut ByteWriter,
    ) -> SnapshotResult<RecordCounts>;

    /// Reads one record per runtime entity and applies them to `world`.
    ///
    /// On error the world must be left as it was before the call.
    fn read_data(
        &self,
        sender: &SnapshotSender,
        runtime: &SnapshotRuntime,
        world: &mut World,
        reader: &mut ByteReader<'_>,
    ) -> SnapshotResult<RecordCounts>;
}

/// [`Streamer`] for any [`SnapshotComponent`].
pub struct ComponentStreamer<T: SnapshotComponent> {
    pattern: String,
    component: Option<ComponentId>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: SnapshotComponent> Default for ComponentStreamer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SnapshotComponent> ComponentStreamer<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pattern: T::pattern(),
            component: None,
            _marker: PhantomData,
        }
    }
}

enum Decoded<T> {
    Present(T),
    Unchanged,
    Absent,
}

impl<T: SnapshotComponent> Streamer for ComponentStreamer<T> {
    fn pattern(&self) -> &str {
        &self.pattern
    }

    fn payload_size(&self) -> Option<usize> {
        Some(T::PAYLOAD_SIZE)
    }

    /// Caches the id of `T`; `None` while no entity in the world has ever had it.
    fn subscribe(&mut self, world: &World) {
        self.component = world.component_id::<T>();
    }

    fn detect_changes(&mut self, world: &mut World) {
        track_changes::<T>(world);
    }

    fn write_data(
        &self,
        receiver: &SnapshotReceiver,
        runtime: &SnapshotRuntime,
        world: &World,
        writer: &mut ByteWriter,
    ) -> SnapshotResult<RecordCounts> {
        let mut counts = RecordCounts::default();
        // Without an id no entity can hold `T`, so every lookup is skipped.
        let registered = self.component.is_some();

        for index in 0..runtime.entity_count() {
            let present = runtime
                .world_entity(index)
                .filter(|_| registered)
                .and_then(|entity| world.get::<T>(entity).map(|value| (entity, *value)));

            let reason = match present {
                None => SkipReason::NoComponent,
                Some((entity, _))
                    if !receiver.want_full_snapshot && !is_dirty::<T>(world, entity) =>
                {
                    SkipReason::Delta
                }
                Some(_) => SkipReason::NoSkip,
            };
            writer.write(reason.raw())?;

            if let (SkipReason::NoSkip, Some((_, value))) = (reason, present) {
                let before = writer.len();
                value.write_payload(writer)?;
                let written = writer.len() - before;
                if written != T::PAYLOAD_SIZE {
                    return Err(SnapshotError::PayloadSizeMismatch {
                        pattern: self.pattern.clone(),
                        expected: T::PAYLOAD_SIZE,
                        actual: written,
                    });
                }
            }
            counts.record(reason);
        }
        Ok(counts)
    }

    fn read_data(
        &self,
        _sender: &SnapshotSender,
        runtime: &SnapshotRuntime,
        world: &mut World,
        reader: &mut ByteReader<'_>,
    ) -> SnapshotResult<RecordCounts> {
        let mut counts = RecordCounts::default();
        let mut decoded = Vec::with_capacity(runtime.entity_count());
        for _ in 0..runtime.entity_count() {
            let reason = SkipReason::parse(reader.read::<u8>()?)?;
            let record = match reason {
                SkipReason::NoSkip => Decoded::Present(T::read_payload(reader)?),
                SkipReason::Delta => Decoded::Unchanged,
                SkipReason::NoComponent => Decoded::Absent,
            };
            counts.record(reason);
            decoded.push(record);
        }

        for (index, record) in decoded.into_iter().enumerate() {
            let Some(entity) = runtime.world_entity(index) else {
                continue;
            };
            let Ok(mut entity_mut) = world.get_entity_mut(entity) else {
                continue;
            };
            match record {
                Decoded::Present(value) => {
                    entity_mut.insert(value);
                }
                Decoded::Unchanged => {}
                Decoded::Absent => {
                    entity_mut.remove::<(T, DataChanged<T>)>();
                }
            }
        }
        Ok(counts)
    }
}
