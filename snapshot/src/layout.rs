//! Snapshot payload layout.
//!
//! ```text
//! entity_count   i32
//! entities       (index i32, version i32) * entity_count
//! streamer_count i32
//! repeat streamer_count:
//!     end_offset i32   absolute offset of the slice end within the payload
//!     pattern_id i32   sender-local pattern id
//!     records          one per entity: discriminant u8 [+ payload]
//! ```

use std::collections::HashSet;

use buffer::{ByteReader, ByteWriter};
use pattern::PatternId;

use crate::config::SnapshotLimits;
use crate::error::{SnapshotError, SnapshotLimitKind, SnapshotResult};
use crate::record::{RecordCounts, SkipReason};
use crate::types::EntityRef;

/// Size of one serialized entity reference.
pub const ENTITY_REF_SIZE: usize = 8;

/// Size of a slice header (end offset + pattern id).
pub const SLICE_HEADER_SIZE: usize = 8;

pub fn write_entity_list(writer: &mut ByteWriter, entities: &[EntityRef]) -> SnapshotResult<()> {
    writer.write(count_field(entities.len(), SnapshotLimitKind::Entities)?)?;
    for entity in entities {
        writer.write(entity.index)?;
        writer.write(entity.version)?;
    }
    Ok(())
}

pub fn read_entity_list(
    reader: &mut ByteReader<'_>,
    limits: &SnapshotLimits,
) -> SnapshotResult<Vec<EntityRef>> {
    let count = read_count(
        reader,
        "entity",
        SnapshotLimitKind::Entities,
        limits.max_entities,
    )?;
    // Each entry needs 8 bytes; reject counts the buffer cannot hold before allocating.
    let needed = count.saturating_mul(ENTITY_REF_SIZE);
    if needed > reader.remaining() {
        return Err(SnapshotError::Buffer(buffer::BufferError::EndOfBuffer {
            requested: needed,
            available: reader.remaining(),
        }));
    }
    let mut entities = Vec::with_capacity(count);
    let mut seen = HashSet::with_capacity(count);
    for _ in 0..count {
        let index = reader.read::<i32>()?;
        let version = reader.read::<i32>()?;
        let entity = EntityRef::new(index, version);
        if !seen.insert(entity) {
            return Err(SnapshotError::DuplicateEntity { index, version });
        }
        entities.push(entity);
    }
    Ok(entities)
}

/// Reads a non-negative i32 count and checks it against `limit`.
pub fn read_count(
    reader: &mut ByteReader<'_>,
    field: &'static str,
    kind: SnapshotLimitKind,
    limit: usize,
) -> SnapshotResult<usize> {
    let value = reader.read::<i32>()?;
    let count = usize::try_from(value).map_err(|_| SnapshotError::NegativeCount { field, value })?;
    if count > limit {
        return Err(SnapshotError::LimitsExceeded {
            kind,
            limit,
            actual: count,
        });
    }
    Ok(count)
}

pub(crate) fn count_field(len: usize, kind: SnapshotLimitKind) -> SnapshotResult<i32> {
    i32::try_from(len).map_err(|_| SnapshotError::LimitsExceeded {
        kind,
        limit: i32::MAX as usize,
        actual: len,
    })
}

/// A slice header read from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceHeader {
    pub pattern_id: PatternId,
    /// Offset of the first record.
    pub body_start: usize,
    /// Declared end offset of the slice.
    pub end: usize,
}

/// Reads a slice header and validates its end offset against the payload.
pub fn read_slice_header(reader: &mut ByteReader<'_>) -> SnapshotResult<SliceHeader> {
    let end_offset = reader.read::<i32>()?;
    let pattern_id = PatternId::new(reader.read::<i32>()?);
    let body_start = reader.position();
    let end = usize::try_from(end_offset)
        .ok()
        .filter(|end| *end >= body_start && *end <= reader.len())
        .ok_or(SnapshotError::InvalidEndOffset {
            end_offset,
            position: body_start,
            len: reader.len(),
        })?;
    Ok(SliceHeader {
        pattern_id,
        body_start,
        end,
    })
}

/// A streamer slice located in a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceLayout<'a> {
    pub header: SliceHeader,
    pub body: &'a [u8],
}

impl SliceLayout<'_> {
    /// Walks the records of a fixed-payload slice.
    pub fn record_counts(
        &self,
        entity_count: usize,
        payload_size: usize,
    ) -> SnapshotResult<RecordCounts> {
        let mut reader = ByteReader::new(self.body);
        let mut counts = RecordCounts::default();
        for _ in 0..entity_count {
            let reason = SkipReason::parse(reader.read::<u8>()?)?;
            if reason == SkipReason::NoSkip {
                reader.skip(payload_size)?;
            }
            counts.record(reason);
        }
        Ok(counts)
    }
}

/// Entity list and slices of a payload, without touching any world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotLayout<'a> {
    pub entities: Vec<EntityRef>,
    pub slices: Vec<SliceLayout<'a>>,
}

/// Splits a payload into its entity list and slices using the end offsets.
pub fn parse_layout<'a>(
    bytes: &'a [u8],
    limits: &SnapshotLimits,
) -> SnapshotResult<SnapshotLayout<'a>> {
    let mut reader = ByteReader::new(bytes);
    let entities = read_entity_list(&mut reader, limits)?;
    let count = read_count(
        &mut reader,
        "streamer",
        SnapshotLimitKind::Streamers,
        limits.max_streamers,
    )?;
    let mut slices = Vec::with_capacity(count);
    for _ in 0..count {
        let header = read_slice_header(&mut reader)?;
        slices.push(SliceLayout {
            header,
            body: &bytes[header.body_start..header.end],
        });
        reader.seek(header.end)?;
    }
    Ok(SnapshotLayout { entities, slices })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_list_layout() {
        let mut writer = ByteWriter::new();
        write_entity_list(&mut writer, &[EntityRef::new(5, 2)]).unwrap();
        assert_eq!(writer.as_slice(), &[1, 0, 0, 0, 5, 0, 0, 0, 2, 0, 0, 0]);
        let bytes = writer.finish();
        let entities =
            read_entity_list(&mut ByteReader::new(&bytes), &SnapshotLimits::default()).unwrap();
        assert_eq!(entities, vec![EntityRef::new(5, 2)]);
    }

    #[test]
    fn entity_count_checked_against_buffer() {
        let bytes = 1000i32.to_le_bytes();
        let err =
            read_entity_list(&mut ByteReader::new(&bytes), &SnapshotLimits::default()).unwrap_err();
        assert!(matches!(err, SnapshotError::Buffer(_)));
    }

    #[test]
    fn duplicate_entity_rejected() {
        let mut writer = ByteWriter::new();
        let listed = [EntityRef::new(7, 0), EntityRef::new(3, 1), EntityRef::new(7, 0)];
        write_entity_list(&mut writer, &listed).unwrap();
        let bytes = writer.finish();
        let err =
            read_entity_list(&mut ByteReader::new(&bytes), &SnapshotLimits::default()).unwrap_err();
        assert_eq!(
            err,
            SnapshotError::DuplicateEntity {
                index: 7,
                version: 0
            }
        );
    }

    #[test]
    fn entity_count_limit() {
        let bytes = 300i32.to_le_bytes();
        let err = read_entity_list(&mut ByteReader::new(&bytes), &SnapshotLimits::for_testing())
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
    fn negative_count_rejected() {
        let bytes = (-2i32).to_le_bytes();
        let err =
            read_entity_list(&mut ByteReader::new(&bytes), &SnapshotLimits::default()).unwrap_err();
        assert_eq!(
            err,
            SnapshotError::NegativeCount {
                field: "entity",
                value: -2
            }
        );
    }

    #[test]
    fn slice_end_before_body_rejected() {
        let mut writer = ByteWriter::new();
        writer.write(4i32).unwrap();
        writer.write(1i32).unwrap();
        let bytes = writer.finish();
        let err = read_slice_header(&mut ByteReader::new(&bytes)).unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidEndOffset { end_offset: 4, .. }));
    }

    #[test]
    fn slice_end_past_payload_rejected() {
        let mut writer = ByteWriter::new();
        writer.write(64i32).unwrap();
        writer.write(1i32).unwrap();
        let bytes = writer.finish();
        assert!(read_slice_header(&mut ByteReader::new(&bytes)).is_err());
    }

    #[test]
    fn parse_layout_splits_slices() {
        let mut writer = ByteWriter::new();
        write_entity_list(&mut writer, &[EntityRef::new(0, 0), EntityRef::new(1, 0)]).unwrap();
        writer.write(2i32).unwrap();
        for (pattern, body) in [(3i32, &[1u8, 2][..]), (4i32, &[0u8, 7, 7, 2][..])] {
            let end = writer.create_marker::<i32>().unwrap();
            writer.write(pattern).unwrap();
            writer.write_bytes(body).unwrap();
            let offset = i32::try_from(writer.len()).unwrap();
            writer.patch(end, offset).unwrap();
        }
        let bytes = writer.finish();

        let layout = parse_layout(&bytes, &SnapshotLimits::default()).unwrap();
        assert_eq!(layout.entities.len(), 2);
        assert_eq!(layout.slices.len(), 2);
        assert_eq!(layout.slices[0].header.pattern_id, PatternId::new(3));
        assert_eq!(layout.slices[1].body, &[0, 7, 7, 2]);

        let counts = layout.slices[1].record_counts(2, 2).unwrap();
        assert_eq!(counts.present, 1);
        assert_eq!(counts.absent, 1);
    }
}
