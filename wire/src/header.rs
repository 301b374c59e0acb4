//! Frame header types and constants.

use buffer::{ByteReader, ByteWriter};

use crate::error::{DecodeError, EncodeError, WireResult};

/// Frame header size in bytes: type(1) + pattern(4) + length(4) + compressed(1) + flags(1).
pub const FRAME_HEADER_SIZE: usize = 1 + 4 + 4 + 1 + 1;

/// Payloads strictly larger than this are LZ4-compressed.
pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 96;

/// First byte of every message on the snapshot channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    Unknown = 0,
    /// A message addressed by a negotiated pattern id.
    MessagePattern = 1,
    /// A pattern bank announcement.
    PatternExchange = 2,
}

impl MessageType {
    /// Parses a message type from a raw byte.
    pub fn parse(raw: u8) -> WireResult<Self> {
        match raw {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::MessagePattern),
            2 => Ok(Self::PatternExchange),
            _ => Err(DecodeError::UnexpectedMessageType { found: raw }),
        }
    }

    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }
}

/// Snapshot flags carried in the frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SnapshotFlags(u8);

impl SnapshotFlags {
    /// The snapshot ignores dirty tracking and carries every record.
    pub const FULL_DATA: u8 = 1 << 0;

    /// Reserved bits mask (must be zero).
    const RESERVED_MASK: u8 = !Self::FULL_DATA;

    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn full_data() -> Self {
        Self(Self::FULL_DATA)
    }

    #[must_use]
    pub const fn delta() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn is_full_data(self) -> bool {
        self.0 & Self::FULL_DATA != 0
    }

    /// Returns `true` if no reserved bits are set.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 & Self::RESERVED_MASK == 0
    }
}

/// Header preceding every framed snapshot payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub message_type: MessageType,
    /// Wire-local pattern id of the message, translated by the receiver.
    pub pattern_id: i32,
    /// Length of the payload before compression.
    pub uncompressed_len: i32,
    pub is_compressed: bool,
    pub flags: SnapshotFlags,
}

impl FrameHeader {
    /// Appends the header to `writer`.
    pub fn encode(&self, writer: &mut ByteWriter) -> Result<(), EncodeError> {
        writer.write(self.message_type.raw())?;
        writer.write(self.pattern_id)?;
        writer.write(self.uncompressed_len)?;
        writer.write(u8::from(self.is_compressed))?;
        writer.write(self.flags.raw())?;
        Ok(())
    }

    /// Reads and validates a header.
    pub fn decode(reader: &mut ByteReader<'_>) -> WireResult<Self> {
        if reader.remaining() < FRAME_HEADER_SIZE {
            return Err(DecodeError::FrameTooSmall {
                actual: reader.remaining(),
                required: FRAME_HEADER_SIZE,
            });
        }
        let message_type = MessageType::parse(reader.read::<u8>()?)?;
        let pattern_id = reader.read::<i32>()?;
        let uncompressed_len = reader.read::<i32>()?;
        if uncompressed_len < 0 {
            return Err(DecodeError::NegativeLength {
                value: uncompressed_len,
            });
        }
        let is_compressed = match reader.read::<u8>()? {
            0 => false,
            1 => true,
            found => return Err(DecodeError::InvalidCompressionFlag { found }),
        };
        let flags = SnapshotFlags::from_raw(reader.read::<u8>()?);
        if !flags.is_valid() {
            return Err(DecodeError::InvalidFlags { flags: flags.raw() });
        }
        Ok(Self {
            message_type,
            pattern_id,
            uncompressed_len,
            is_compressed,
            flags,
        })
    }

    /// Declared uncompressed length as a `usize`.
    #[must_use]
    pub fn payload_len(&self) -> usize {
        usize::try_from(self.uncompressed_len).unwrap_or(0)
    }
}
