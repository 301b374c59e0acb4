//! Message framing and LZ4 compression framing for deltasnap.
//!
//! Every snapshot message starts with an 11-byte [`FrameHeader`]: message
//! type, the wire-local pattern id, the uncompressed payload length, a
//! compressed flag and the [`SnapshotFlags`]. Payloads larger than a threshold
//! (96 bytes by default) are LZ4 block-compressed.
//!
//! # Design Principles
//!
//! - **Exact lengths** - Decompression must produce exactly the declared length.
//! - **Bounded decoding** - Length fields are validated against limits before allocating.
//! - **No domain knowledge** - This crate frames bytes, it does not parse snapshots.

mod error;
mod frame;
mod header;
mod limits;

pub use error::{DecodeError, EncodeError, LimitKind, WireResult};
pub use frame::{
    decode_frame, decompress_payload, encode_frame, framed_len, peek_message_type, Frame,
    FrameScratch,
};
pub use header::{
    FrameHeader, MessageType, SnapshotFlags, DEFAULT_COMPRESSION_THRESHOLD, FRAME_HEADER_SIZE,
};
pub use limits::Limits;
