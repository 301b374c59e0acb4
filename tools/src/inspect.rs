use anyhow::{Context, Result};
use serde::Serialize;
use snapshot::transform::register_transform_streamers;
use snapshot::{parse_layout, EntityRef, RecordCounts, SnapshotLimits, SnapshotManager};
use wire::{decode_frame, decompress_payload, Limits};

/// Frame header fields as seen on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct FrameSummary {
    pub pattern_id: i32,
    pub wire_bytes: usize,
    pub uncompressed_bytes: usize,
    pub is_compressed: bool,
    pub full: bool,
    pub flags: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct SliceSummary {
    pub pattern_id: i32,
    /// Pattern name, when the id is known to the catalog.
    pub pattern: Option<String>,
    /// Slice size including its 8-byte header.
    pub byte_len: usize,
    /// Record histogram, when the streamer has a fixed payload size.
    pub records: Option<RecordCounts>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub frame: FrameSummary,
    pub entities: Vec<EntityRef>,
    pub slices: Vec<SliceSummary>,
}

/// A manager with the builtin streamers, used to name pattern ids.
pub fn builtin_manager() -> Result<SnapshotManager> {
    let mut manager =
        SnapshotManager::new(SnapshotLimits::default()).context("create snapshot manager")?;
    register_transform_streamers(&mut manager).context("register transform streamers")?;
    Ok(manager)
}

/// Decodes a frame and walks its snapshot layout without applying it.
///
/// Pattern ids are resolved against `catalog`, which is assumed to share the
/// sender's bank.
pub fn inspect_frame(
    bytes: &[u8],
    wire_limits: &Limits,
    limits: &SnapshotLimits,
    catalog: &SnapshotManager,
) -> Result<InspectReport> {
    let frame = decode_frame(bytes, wire_limits).context("decode frame header")?;
    let mut payload = Vec::new();
    decompress_payload(&frame, &mut payload).context("decompress payload")?;
    let layout = parse_layout(&payload, limits).context("parse snapshot layout")?;

    let entity_count = layout.entities.len();
    let slices = layout
        .slices
        .iter()
        .map(|slice| {
            let pattern_id = slice.header.pattern_id;
            let pattern = catalog.bank().name_of(pattern_id).map(str::to_owned);
            let records = pattern
                .as_deref()
                .and_then(|name| catalog.registry().find(name))
                .and_then(|streamer| streamer.payload_size())
                .and_then(|size| slice.record_counts(entity_count, size).ok());
            SliceSummary {
                pattern_id: pattern_id.raw(),
                pattern,
                byte_len: slice.header.end - slice.header.body_start + snapshot::SLICE_HEADER_SIZE,
                records,
            }
        })
        .collect();

    Ok(InspectReport {
        frame: FrameSummary {
            pattern_id: frame.header.pattern_id,
            wire_bytes: bytes.len(),
            uncompressed_bytes: payload.len(),
            is_compressed: frame.header.is_compressed,
            full: frame.header.flags.is_full_data(),
            flags: frame.header.flags.raw(),
        },
        entities: layout.entities,
        slices,
    })
}

pub fn format_inspect_pretty(report: &InspectReport) -> String {
    let frame = &report.frame;
    let mut out = format!(
        "pattern: {} wire: {} bytes raw: {} bytes{} ({})\n",
        frame.pattern_id,
        frame.wire_bytes,
        frame.uncompressed_bytes,
        if frame.is_compressed { " lz4" } else { "" },
        if frame.full { "full" } else { "delta" },
    );
    out.push_str(&format!("entities: {}\n", report.entities.len()));
    out.push_str("slices:\n");
    for slice in &report.slices {
        let name = slice
            .pattern
            .clone()
            .unwrap_or_else(|| format!("<unknown {}>", slice.pattern_id));
        out.push_str(&format!("  {name}: {} bytes", slice.byte_len));
        if let Some(records) = slice.records {
            out.push_str(&format!(
                " ({} present, {} delta, {} absent)",
                records.present, records.delta, records.absent
            ));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::World;
    use snapshot::transform::Position;
    use snapshot::{ConnectionId, GenerateSnapshot, SnapshotReceiver, SnapshotTick};
    use wire::{encode_frame, FrameScratch};

    fn frame(count: usize) -> Vec<u8> {
        let mut manager = builtin_manager().unwrap();
        let mut world = World::new();
        let entities: Vec<_> = (0..count)
            .map(|_| world.spawn((GenerateSnapshot, Position::default())).id())
            .collect();
        manager.detect_changes(&mut world);
        let generation = manager
            .generate_for_connection(
                &world,
                &SnapshotReceiver::new(ConnectionId::new(1), true),
                &entities,
                true,
                SnapshotTick::new(1),
            )
            .unwrap();
        let mut out = buffer::ByteWriter::new();
        encode_frame(
            manager.snapshot_pattern().raw(),
            generation.flags,
            &generation.data,
            96,
            &Limits::default(),
            &mut FrameScratch::new(),
            &mut out,
        )
        .unwrap();
        out.finish()
    }

    #[test]
    fn inspect_reports_slices() {
        let bytes = frame(4);
        let catalog = builtin_manager().unwrap();
        let report =
            inspect_frame(&bytes, &Limits::default(), &SnapshotLimits::default(), &catalog)
                .unwrap();
        assert_eq!(report.entities.len(), 4);
        assert!(report.frame.full);
        assert!(report.frame.is_compressed);
        assert_eq!(report.slices.len(), 3);
        let position = &report.slices[0];
        assert_eq!(position.pattern.as_deref(), Some("auto.transform.Position"));
        assert_eq!(position.byte_len, 8 + 4 * 13);
        assert_eq!(position.records.unwrap().present, 4);
        assert_eq!(report.slices[1].records.unwrap().absent, 4);

        let text = format_inspect_pretty(&report);
        assert!(text.contains("entities: 4"));
        assert!(text.contains("auto.transform.Rotation"));
    }

    #[test]
    fn inspect_rejects_garbage() {
        let catalog = builtin_manager().unwrap();
        let result = inspect_frame(
            &[1, 2, 3],
            &Limits::default(),
            &SnapshotLimits::default(),
            &catalog,
        );
        assert!(result.is_err());
    }
}
