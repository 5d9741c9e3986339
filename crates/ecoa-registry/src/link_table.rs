//! Link Table - mirrored sender/receiver binding storage.
//!
//! Resolved bindings are stored twice:
//!
//! ```text
//! receivers: sender   -> sender_key   -> receiver_key -> { receiver, .. }
//! senders:   receiver -> receiver_key -> sender_key   -> { sender, .. }
//! ```
//!
//! A binding is identified by both entities and both keys, so two receiver
//! operations deployed under the same key each keep their own binding.
//! [`LinkTable::bind`] and [`LinkTable::unbind`] are the only mutations and
//! always touch both directions. All maps keep insertion order.

use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxBuildHasher;

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Entities bound under one pair of keys.
pub type Peers<Id> = IndexSet<Id, FxBuildHasher>;

/// Bindings of one entity, grouped by its own resolved key.
pub type Bindings<Id> = IndexMap<String, IndexMap<String, Peers<Id>>>;

/// Number of bindings in one entity's groups.
pub fn binding_count<Id>(bindings: &Bindings<Id>) -> usize {
    bindings
        .values()
        .flat_map(IndexMap::values)
        .map(IndexSet::len)
        .sum()
}

/// Bidirectional binding table.
#[derive(Debug, Clone)]
pub struct LinkTable<Id> {
    receivers: FxIndexMap<Id, Bindings<Id>>,
    senders: FxIndexMap<Id, Bindings<Id>>,
}

impl<Id> Default for LinkTable<Id> {
    fn default() -> Self {
        Self {
            receivers: FxIndexMap::default(),
            senders: FxIndexMap::default(),
        }
    }
}

impl<Id: Copy + Eq + Hash> LinkTable<Id> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `sender[sender_key] -> receiver[receiver_key]` in both directions.
    ///
    /// Returns `false` if the binding already existed.
    pub fn bind(
        &mut self,
        sender: Id,
        sender_key: &str,
        receiver: Id,
        receiver_key: &str,
    ) -> bool {
        let added = insert_nested(&mut self.receivers, sender, sender_key, receiver_key, receiver);
        let mirrored = insert_nested(&mut self.senders, receiver, receiver_key, sender_key, sender);
        debug_assert_eq!(added, mirrored);
        added
    }

    /// Remove the binding `sender[sender_key] -> receiver[receiver_key]` in
    /// both directions, pruning groups left empty. Returns `false` if there
    /// was no such binding.
    pub fn unbind(
        &mut self,
        sender: Id,
        sender_key: &str,
        receiver: Id,
        receiver_key: &str,
    ) -> bool {
        let removed = remove_nested(&mut self.receivers, sender, sender_key, receiver_key, receiver);
        let mirrored = remove_nested(&mut self.senders, receiver, receiver_key, sender_key, sender);
        debug_assert_eq!(removed, mirrored);
        removed
    }

    /// Whether `sender[sender_key] -> receiver[receiver_key]` is bound.
    pub fn contains(&self, sender: Id, sender_key: &str, receiver: Id, receiver_key: &str) -> bool {
        self.receivers
            .get(&sender)
            .and_then(|groups| groups.get(sender_key))
            .and_then(|entries| entries.get(receiver_key))
            .is_some_and(|peers| peers.contains(&receiver))
    }

    /// Receivers of a sender, grouped by sender key.
    pub fn receivers_of(&self, sender: Id) -> Option<&Bindings<Id>> {
        self.receivers.get(&sender)
    }

    /// Senders of a receiver, grouped by receiver key.
    pub fn senders_of(&self, receiver: Id) -> Option<&Bindings<Id>> {
        self.senders.get(&receiver)
    }

    /// Every binding as `(sender, sender_key, receiver_key, receiver)`, in
    /// insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Id, &str, &str, Id)> {
        self.receivers.iter().flat_map(|(&sender, groups)| {
            groups.iter().flat_map(move |(sender_key, entries)| {
                entries.iter().flat_map(move |(receiver_key, receivers)| {
                    receivers.iter().map(move |&receiver| {
                        (sender, sender_key.as_str(), receiver_key.as_str(), receiver)
                    })
                })
            })
        })
    }

    /// Senders that have at least one binding.
    pub fn senders(&self) -> impl Iterator<Item = Id> + '_ {
        self.receivers.keys().copied()
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.receivers.values().map(binding_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }
}

fn insert_nested<Id: Copy + Eq + Hash>(
    map: &mut FxIndexMap<Id, Bindings<Id>>,
    owner: Id,
    group: &str,
    key: &str,
    peer: Id,
) -> bool {
    map.entry(owner)
        .or_default()
        .entry(group.to_string())
        .or_default()
        .entry(key.to_string())
        .or_default()
        .insert(peer)
}

fn remove_nested<Id: Copy + Eq + Hash>(
    map: &mut FxIndexMap<Id, Bindings<Id>>,
    owner: Id,
    group: &str,
    key: &str,
    peer: Id,
) -> bool {
    let Some(groups) = map.get_mut(&owner) else {
        return false;
    };
    let Some(entries) = groups.get_mut(group) else {
        return false;
    };
    let Some(peers) = entries.get_mut(key) else {
        return false;
    };
    if !peers.shift_remove(&peer) {
        return false;
    }
    if peers.is_empty() {
        entries.shift_remove(key);
    }
    if entries.is_empty() {
        groups.shift_remove(group);
    }
    if groups.is_empty() {
        map.shift_remove(&owner);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_is_mirrored() {
        let mut table = LinkTable::new();
        assert!(table.bind(1u32, "M1:A", 2u32, "M2:X"));
        assert!(table.receivers_of(1).unwrap()["M1:A"]["M2:X"].contains(&2));
        assert!(table.senders_of(2).unwrap()["M2:X"]["M1:A"].contains(&1));
        assert!(table.contains(1, "M1:A", 2, "M2:X"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn duplicate_bind_reports_existing() {
        let mut table = LinkTable::new();
        assert!(table.bind(1u32, "a", 2u32, "b"));
        assert!(!table.bind(1u32, "a", 2u32, "b"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn unbind_prunes_both_directions() {
        let mut table = LinkTable::new();
        table.bind(1u32, "a", 2u32, "b");
        table.bind(1u32, "a", 3u32, "c");
        assert!(table.unbind(1, "a", 2, "b"));
        assert!(table.senders_of(2).is_none());
        assert_eq!(table.receivers_of(1).unwrap()["a"].len(), 1);
        assert!(!table.unbind(1, "a", 2, "c"));
        assert!(table.unbind(1, "a", 3, "c"));
        assert!(table.is_empty());
        assert!(!table.unbind(1, "a", 3, "c"));
    }

    #[test]
    fn iteration_keeps_insertion_order() {
        let mut table = LinkTable::new();
        table.bind(5u32, "s:B", 7u32, "r:X");
        table.bind(5u32, "s:A", 7u32, "r:X");
        table.bind(4u32, "t", 7u32, "r:Y");
        let keys: Vec<_> = table.iter().map(|(_, sk, rk, _)| (sk, rk)).collect();
        assert_eq!(keys, vec![("s:B", "r:X"), ("s:A", "r:X"), ("t", "r:Y")]);
        assert_eq!(table.senders().collect::<Vec<_>>(), vec![5, 4]);
    }

    #[test]
    fn receivers_sharing_a_key_stay_mirrored() {
        let mut table = LinkTable::new();
        assert!(table.bind(1u32, "M1:A", 2u32, "M2:A"));
        assert!(table.bind(1u32, "M1:A", 3u32, "M2:A"));
        assert_eq!(table.len(), 2);

        let receivers = &table.receivers_of(1).unwrap()["M1:A"]["M2:A"];
        assert_eq!(receivers.iter().copied().collect::<Vec<_>>(), vec![2, 3]);
        assert!(table.senders_of(2).unwrap()["M2:A"]["M1:A"].contains(&1));
        assert!(table.senders_of(3).unwrap()["M2:A"]["M1:A"].contains(&1));

        assert!(table.unbind(1, "M1:A", 2, "M2:A"));
        assert!(table.senders_of(2).is_none());
        assert!(table.contains(1, "M1:A", 3, "M2:A"));
        assert_eq!(binding_count(table.receivers_of(1).unwrap()), 1);
    }
}
