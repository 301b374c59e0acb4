//! Pattern bank announcement codec.
//!
//! Layout (little-endian):
//!
//! ```text
//! count   i32
//! repeat count:
//!     id       i32
//!     name_len i32
//!     name     [u8; name_len]   (UTF-8)
//! hash    u64                    (bank_hash of the entries)
//! ```

use std::collections::HashSet;

use buffer::{ByteReader, ByteWriter};

use crate::bank::{validate_name, PatternBank, PatternId, MAX_PATTERNS};
use crate::error::{PatternError, PatternResult};
use crate::hash::{bank_hash, entries_hash};

/// A peer's pattern bank as received on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Announcement {
    pub entries: Vec<(PatternId, String)>,
    pub hash: u64,
}

impl Announcement {
    /// Builds the announcement for a local bank.
    #[must_use]
    pub fn from_bank(bank: &PatternBank) -> Self {
        Self {
            entries: bank
                .entries()
                .map(|(id, name)| (id, name.to_owned()))
                .collect(),
            hash: bank_hash(bank),
        }
    }
}

/// Appends the announcement for `bank` to `writer`.
pub fn encode_announcement(bank: &PatternBank, writer: &mut ByteWriter) -> PatternResult<()> {
    let count = i32::try_from(bank.len()).map_err(|_| PatternError::TooManyPatterns {
        count: bank.len(),
        max: MAX_PATTERNS,
    })?;
    writer.write(count)?;
    for (id, name) in bank.entries() {
        writer.write(id.raw())?;
        // Names are bounded by MAX_PATTERN_NAME_LEN at registration.
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let len = name.len() as i32;
        writer.write(len)?;
        writer.write_bytes(name.as_bytes())?;
    }
    writer.write(bank_hash(bank))?;
    Ok(())
}

/// Reads and validates an announcement.
pub fn decode_announcement(reader: &mut ByteReader<'_>) -> PatternResult<Announcement> {
    let count = read_len(reader)?;
    if count > MAX_PATTERNS {
        return Err(PatternError::TooManyPatterns {
            count,
            max: MAX_PATTERNS,
        });
    }

    let mut entries = Vec::with_capacity(count);
    let mut ids = HashSet::with_capacity(count);
    let mut names = HashSet::with_capacity(count);
    for _ in 0..count {
        let id = PatternId::new(reader.read::<i32>()?);
        let len = read_len(reader)?;
        let bytes = reader.read_bytes(len)?;
        let name = std::str::from_utf8(bytes).map_err(|_| PatternError::InvalidUtf8)?;
        validate_name(name)?;
        if !ids.insert(id) {
            return Err(PatternError::DuplicateId { id: id.raw() });
        }
        if !names.insert(name) {
            return Err(PatternError::DuplicateName {
                name: name.to_owned(),
            });
        }
        entries.push((id, name.to_owned()));
    }

    let expected = reader.read::<u64>()?;
    let actual = entries_hash(entries.iter().map(|(id, name)| (*id, name.as_str())));
    if expected != actual {
        return Err(PatternError::HashMismatch { expected, actual });
    }
    Ok(Announcement {
        entries,
        hash: expected,
    })
}

fn read_len(reader: &mut ByteReader<'_>) -> PatternResult<usize> {
    let value = reader.read::<i32>()?;
    usize::try_from(value).map_err(|_| PatternError::NegativeLength { value })
}
