//! Compression framing for snapshot payloads.

use buffer::{ByteReader, ByteWriter};

use crate::error::{DecodeError, EncodeError, LimitKind, WireResult};
use crate::header::{FrameHeader, MessageType, SnapshotFlags, FRAME_HEADER_SIZE};
use crate::limits::Limits;

/// A decoded frame borrowing its payload from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub header: FrameHeader,
    /// Raw or LZ4-compressed payload bytes, per `header.is_compressed`.
    pub payload: &'a [u8],
}

/// Reusable compression buffers.
#[derive(Debug, Default)]
pub struct FrameScratch {
    compressed: Vec<u8>,
}

impl FrameScratch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Frames `payload` into `out`, compressing it when it is larger than `threshold`.
///
/// `out` is cleared first. Returns the header that was written.
pub fn encode_frame(
    pattern_id: i32,
    flags: SnapshotFlags,
    payload: &[u8],
    threshold: usize,
    limits: &Limits,
    scratch: &mut FrameScratch,
    out: &mut ByteWriter,
) -> Result<FrameHeader, EncodeError> {
    if payload.len() > limits.max_uncompressed_bytes {
        return Err(EncodeError::LimitsExceeded {
            kind: LimitKind::UncompressedBytes,
            limit: limits.max_uncompressed_bytes,
            actual: payload.len(),
        });
    }
    let uncompressed_len = i32::try_from(payload.len()).map_err(|_| EncodeError::LengthOverflow {
        length: payload.len(),
    })?;
    let is_compressed = payload.len() > threshold;
    let header = FrameHeader {
        message_type: MessageType::MessagePattern,
        pattern_id,
        uncompressed_len,
        is_compressed,
        flags,
    };

    out.clear();
    header.encode(out)?;
    if is_compressed {
        let max_len = lz4_flex::block::get_maximum_output_size(payload.len());
        scratch.compressed.clear();
        scratch.compressed.resize(max_len, 0);
        let written = lz4_flex::block::compress_into(payload, &mut scratch.compressed).map_err(
            |err| EncodeError::Compression {
                reason: err.to_string(),
            },
        )?;
        out.write_bytes(&scratch.compressed[..written])?;
    } else {
        out.write_bytes(payload)?;
    }

    if out.len() > limits.max_frame_bytes {
        return Err(EncodeError::LimitsExceeded {
            kind: LimitKind::FrameBytes,
            limit: limits.max_frame_bytes,
            actual: out.len(),
        });
    }
    Ok(header)
}

/// Decodes a frame header and borrows its payload.
///
/// Only [`MessageType::MessagePattern`] frames are accepted. For uncompressed
/// frames the payload length must equal the declared length.
pub fn decode_frame<'a>(bytes: &'a [u8], limits: &Limits) -> WireResult<Frame<'a>> {
    if bytes.len() > limits.max_frame_bytes {
        return Err(DecodeError::LimitsExceeded {
            kind: LimitKind::FrameBytes,
            limit: limits.max_frame_bytes,
            actual: bytes.len(),
        });
    }
    let mut reader = ByteReader::new(bytes);
    let header = FrameHeader::decode(&mut reader)?;
    if header.message_type != MessageType::MessagePattern {
        return Err(DecodeError::UnexpectedMessageType {
            found: header.message_type.raw(),
        });
    }
    let declared = header.payload_len();
    if declared > limits.max_uncompressed_bytes {
        return Err(DecodeError::LimitsExceeded {
            kind: LimitKind::UncompressedBytes,
            limit: limits.max_uncompressed_bytes,
            actual: declared,
        });
    }
    let payload = reader.rest();
    if !header.is_compressed && payload.len() != declared {
        return Err(DecodeError::PayloadLengthMismatch {
            header_len: declared,
            actual_len: payload.len(),
        });
    }
    Ok(Frame { header, payload })
}

/// Writes the uncompressed payload of `frame` into `out`.
///
/// Decompression must produce exactly the declared number of bytes; anything
/// else is an error and `out` must be discarded.
pub fn decompress_payload(frame: &Frame<'_>, out: &mut Vec<u8>) -> WireResult<()> {
    out.clear();
    let declared = frame.header.payload_len();
    if !frame.header.is_compressed {
        out.extend_from_slice(frame.payload);
        return Ok(());
    }
    out.resize(declared, 0);
    let written =
        lz4_flex::block::decompress_into(frame.payload, out).map_err(|err| {
            DecodeError::Decompression {
                reason: err.to_string(),
            }
        })?;
    if written != declared {
        out.clear();
        return Err(DecodeError::DecompressedLengthMismatch {
            declared,
            actual: written,
        });
    }
    Ok(())
}

/// Reads the message type byte without decoding the rest.
pub fn peek_message_type(bytes: &[u8]) -> WireResult<MessageType> {
    let first = bytes.first().ok_or(DecodeError::FrameTooSmall {
        actual: 0,
        required: 1,
    })?;
    MessageType::parse(*first)
}

/// Size of the frame header plus the bytes that follow it.
#[must_use]
pub const fn framed_len(payload_len: usize) -> usize {
    FRAME_HEADER_SIZE + payload_len
}
