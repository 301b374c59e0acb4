//! Deterministic pattern bank hashing.

use blake3::Hasher;

use crate::bank::{PatternBank, PatternId};

/// Computes a deterministic hash of a bank's `(id, name)` entries.
#[must_use]
pub fn bank_hash(bank: &PatternBank) -> u64 {
    entries_hash(bank.entries())
}

pub(crate) fn entries_hash<'a>(entries: impl IntoIterator<Item = (PatternId, &'a str)>) -> u64 {
    let mut hasher = Hasher::new();
    for (id, name) in entries {
        hasher.update(&id.raw().to_le_bytes());
        hasher.update(&(name.len() as u64).to_le_bytes());
        hasher.update(name.as_bytes());
    }
    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let mut a = PatternBank::new();
        let mut b = PatternBank::new();
        for bank in [&mut a, &mut b] {
            bank.register("SyncSnapshot").unwrap();
            bank.register("auto.transform.Position").unwrap();
        }
        assert_eq!(bank_hash(&a), bank_hash(&b));
    }

    #[test]
    fn hash_depends_on_order() {
        let mut a = PatternBank::new();
        a.register("x").unwrap();
        a.register("y").unwrap();
        let mut b = PatternBank::new();
        b.register("y").unwrap();
        b.register("x").unwrap();
        assert_ne!(bank_hash(&a), bank_hash(&b));
    }

    #[test]
    fn name_boundaries_are_hashed() {
        let mut a = PatternBank::new();
        a.register("ab").unwrap();
        a.register("c").unwrap();
        let mut b = PatternBank::new();
        b.register("a").unwrap();
        b.register("bc").unwrap();
        assert_ne!(bank_hash(&a), bank_hash(&b));
    }
}
