//! Per-connection pattern id translation.

use std::collections::HashMap;

use crate::announce::Announcement;
use crate::bank::{PatternBank, PatternId};

/// Translation table between a peer's pattern ids and the local bank.
///
/// Built once per connection from the peer's [`Announcement`]. Names the local
/// bank does not know have no translation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternExchange {
    remote_to_local: HashMap<PatternId, PatternId>,
    local_to_remote: HashMap<PatternId, PatternId>,
    unmatched: Vec<String>,
}

impl PatternExchange {
    /// Matches the peer's entries against `local` by name.
    #[must_use]
    pub fn from_announcement(local: &PatternBank, remote: &Announcement) -> Self {
        let mut exchange = Self::default();
        for (remote_id, name) in &remote.entries {
            match local.id_of(name) {
                Some(local_id) => {
                    exchange.remote_to_local.insert(*remote_id, local_id);
                    exchange.local_to_remote.insert(local_id, *remote_id);
                }
                None => exchange.unmatched.push(name.clone()),
            }
        }
        exchange
    }

    /// Exchange where every id of `bank` maps to itself.
    #[must_use]
    pub fn identity(bank: &PatternBank) -> Self {
        let mut exchange = Self::default();
        for (id, _) in bank.entries() {
            exchange.remote_to_local.insert(id, id);
            exchange.local_to_remote.insert(id, id);
        }
        exchange
    }

    /// Local id for a peer's id.
    #[must_use]
    pub fn origin_id(&self, remote: PatternId) -> Option<PatternId> {
        self.remote_to_local.get(&remote).copied()
    }

    /// Peer's id for a local id.
    #[must_use]
    pub fn remote_id(&self, local: PatternId) -> Option<PatternId> {
        self.local_to_remote.get(&local).copied()
    }

    /// Peer pattern names with no local counterpart.
    #[must_use]
    pub fn unmatched(&self) -> &[String] {
        &self.unmatched
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.remote_to_local.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remote_to_local.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_by_name_not_by_id() {
        let mut server = PatternBank::new();
        server.register("SyncSnapshot").unwrap();
        server.register("auto.transform.Rotation").unwrap();
        server.register("auto.transform.Position").unwrap();

        let mut client = PatternBank::new();
        client.register("SyncSnapshot").unwrap();
        client.register("auto.transform.Position").unwrap();

        let exchange = PatternExchange::from_announcement(&client, &Announcement::from_bank(&server));
        assert_eq!(exchange.origin_id(PatternId::new(3)), Some(PatternId::new(2)));
        assert_eq!(exchange.origin_id(PatternId::new(1)), Some(PatternId::new(1)));
        assert_eq!(exchange.origin_id(PatternId::new(2)), None);
        assert_eq!(exchange.remote_id(PatternId::new(2)), Some(PatternId::new(3)));
        assert_eq!(exchange.unmatched(), &["auto.transform.Rotation".to_string()]);
        assert_eq!(exchange.len(), 2);
    }

    #[test]
    fn identity_maps_every_id() {
        let mut bank = PatternBank::new();
        let a = bank.register("a").unwrap();
        let b = bank.register("b").unwrap();
        let exchange = PatternExchange::identity(&bank);
        assert_eq!(exchange.origin_id(a), Some(a));
        assert_eq!(exchange.origin_id(b), Some(b));
        assert!(exchange.unmatched().is_empty());
    }

    #[test]
    fn empty_exchange_translates_nothing() {
        let exchange = PatternExchange::default();
        assert!(exchange.is_empty());
        assert_eq!(exchange.origin_id(PatternId::new(1)), None);
    }
}
