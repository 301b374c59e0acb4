//! Process-local pattern registry.

use std::collections::HashMap;

use crate::error::{PatternError, PatternResult};

/// Maximum length of a pattern name in bytes.
pub const MAX_PATTERN_NAME_LEN: usize = 256;

/// Maximum number of patterns in a bank.
pub const MAX_PATTERNS: usize = 4096;

/// A compact integer standing in for a pattern name.
///
/// Ids are only meaningful within the bank (or connection) that produced
/// them; ids received from a peer must be translated through a
/// [`PatternExchange`](crate::PatternExchange).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PatternId(i32);

impl PatternId {
    #[must_use]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }
}

impl From<i32> for PatternId {
    fn from(raw: i32) -> Self {
        Self(raw)
    }
}

impl From<PatternId> for i32 {
    fn from(id: PatternId) -> Self {
        id.0
    }
}

/// Registry assigning sequential ids (starting at 1) to pattern names.
#[derive(Debug, Clone, Default)]
pub struct PatternBank {
    names: Vec<String>,
    by_name: HashMap<String, PatternId>,
}

impl PatternBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name`, returning its id. Registering a known name returns the existing id.
    pub fn register(&mut self, name: &str) -> PatternResult<PatternId> {
        if let Some(id) = self.by_name.get(name) {
            return Ok(*id);
        }
        validate_name(name)?;
        if self.names.len() >= MAX_PATTERNS {
            return Err(PatternError::TooManyPatterns {
                count: self.names.len() + 1,
                max: MAX_PATTERNS,
            });
        }
        // Bounded by MAX_PATTERNS, so the cast cannot truncate.
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let id = PatternId(self.names.len() as i32 + 1);
        self.names.push(name.to_owned());
        self.by_name.insert(name.to_owned(), id);
        Ok(id)
    }

    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<PatternId> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub fn name_of(&self, id: PatternId) -> Option<&str> {
        let index = usize::try_from(id.0).ok()?.checked_sub(1)?;
        self.names.get(index).map(String::as_str)
    }

    /// Entries in id order.
    pub fn entries(&self) -> impl Iterator<Item = (PatternId, &str)> + '_ {
        self.names.iter().enumerate().map(|(index, name)| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let id = PatternId(index as i32 + 1);
            (id, name.as_str())
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

pub(crate) fn validate_name(name: &str) -> PatternResult<()> {
    if name.is_empty() {
        return Err(PatternError::EmptyName);
    }
    if name.len() > MAX_PATTERN_NAME_LEN {
        return Err(PatternError::NameTooLong {
            len: name.len(),
            max: MAX_PATTERN_NAME_LEN,
        });
    }
    Ok(())
}
