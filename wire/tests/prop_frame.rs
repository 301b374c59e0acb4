use buffer::ByteWriter;
use proptest::prelude::*;
use wire::{
    decode_frame, decompress_payload, encode_frame, FrameScratch, Limits, SnapshotFlags,
    DEFAULT_COMPRESSION_THRESHOLD,
};

fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 0..512),
        // Repetitive payloads look like real snapshots (mostly skip bytes).
        (prop::collection::vec(0u8..3, 1..8), 0usize..128).prop_map(|(unit, reps)| {
            unit.iter().copied().cycle().take(unit.len() * reps).collect()
        }),
    ]
}

proptest! {
    #[test]
    fn prop_compression_flag_tracks_threshold(
        payload in payload_strategy(),
        threshold in prop_oneof![Just(DEFAULT_COMPRESSION_THRESHOLD), 0usize..256],
        full in any::<bool>(),
    ) {
        let flags = if full { SnapshotFlags::full_data() } else { SnapshotFlags::delta() };
        let mut out = ByteWriter::new();
        let mut scratch = FrameScratch::new();
        let header = encode_frame(
            11,
            flags,
            &payload,
            threshold,
            &Limits::default(),
            &mut scratch,
            &mut out,
        )
        .unwrap();
        prop_assert_eq!(header.is_compressed, payload.len() > threshold);

        let bytes = out.finish();
        let frame = decode_frame(&bytes, &Limits::default()).unwrap();
        prop_assert_eq!(frame.header, header);
        prop_assert_eq!(frame.header.payload_len(), payload.len());

        let mut decoded = Vec::new();
        decompress_payload(&frame, &mut decoded).unwrap();
        prop_assert_eq!(decoded.len(), payload.len());
        prop_assert_eq!(decoded, payload);
    }

    #[test]
    fn prop_arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        if let Ok(frame) = decode_frame(&bytes, &Limits::for_testing()) {
            let mut out = Vec::new();
            if decompress_payload(&frame, &mut out).is_ok() {
                prop_assert_eq!(out.len(), frame.header.payload_len());
            }
        }
    }
}
