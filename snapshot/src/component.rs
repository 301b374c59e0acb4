//! Fixed-size replicated component contract.

use bevy_ecs::prelude::Component;
use buffer::{BufferResult, ByteReader, ByteWriter};

/// A component replicated as a fixed-size payload.
///
/// Implementors pick a stable namespace and type name; together they form
/// the pattern `auto.<namespace>.<TypeName>` both peers use to find the
/// component's streamer.
pub trait SnapshotComponent: Component + Copy + PartialEq {
    const NAMESPACE: &'static str;
    const TYPE_NAME: &'static str;

    /// Exact number of bytes `write_payload` appends.
    const PAYLOAD_SIZE: usize;

    fn write_payload(&self, writer: &mut ByteWriter) -> BufferResult<()>;

    fn read_payload(reader: &mut ByteReader<'_>) -> BufferResult<Self>;

    #[must_use]
    fn pattern() -> String {
        pattern::streamer_pattern(Self::NAMESPACE, Self::TYPE_NAME)
    }
}
