//! Pattern registry and per-connection id exchange for deltasnap.
//!
//! Every replicated system and message is named by a string pattern such as
//! `"auto.transform.Position"` or `"SyncSnapshot"`. A [`PatternBank`] assigns
//! each name a compact [`PatternId`]; peers announce their bank once per
//! connection and build a [`PatternExchange`] that translates the peer's ids
//! into local ones.
//!
//! # Design Principles
//!
//! - **Names are the contract** - Ids are matched by name, never compared raw across peers.
//! - **Deterministic hashing** - Announcements carry a hash of their entries.
//! - **Bounded decoding** - Counts and name lengths are validated before allocating.

mod announce;
mod bank;
mod error;
mod exchange;
mod hash;

pub use announce::{decode_announcement, encode_announcement, Announcement};
pub use bank::{PatternBank, PatternId, MAX_PATTERNS, MAX_PATTERN_NAME_LEN};
pub use error::{PatternError, PatternResult};
pub use exchange::PatternExchange;
pub use hash::bank_hash;

/// Pattern name of the snapshot message itself.
pub const SNAPSHOT_PATTERN: &str = "SyncSnapshot";

/// Builds the pattern name of an automatically registered streamer.
#[must_use]
pub fn streamer_pattern(namespace: &str, type_name: &str) -> String {
    format!("auto.{namespace}.{type_name}")
}
