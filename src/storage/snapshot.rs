//! Raw Export / Import Hook
//!
//! A [`Snapshot`] is an owned copy of the whole key -> container mapping.
//! It is the boundary handed to a persistence collaborator: Strata defines
//! no file or network format of its own, it only guarantees that a snapshot
//! taken with [`StorageEngine::snapshot`](crate::storage::StorageEngine::snapshot)
//! can be loaded back with
//! [`StorageEngine::restore`](crate::storage::StorageEngine::restore).

use crate::storage::value::{ValueContainer, ValueKind};
use bytes::Bytes;
use std::collections::hash_map;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised when importing a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// Lists, sets and hashes are never stored empty.
    #[error("snapshot entry {key:?} holds an empty {kind}")]
    EmptyCollection { key: Bytes, kind: ValueKind },
}

/// An owned copy of every entry in a storage engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    entries: HashMap<Bytes, ValueContainer>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one entry.
    pub fn insert(&mut self, key: Bytes, container: ValueContainer) -> Option<ValueContainer> {
        self.entries.insert(key, container)
    }

    /// Returns the container stored under `key`, if any.
    pub fn get(&self, key: &[u8]) -> Option<&ValueContainer> {
        self.entries.get(key)
    }

    /// Number of entries in the snapshot.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the snapshot holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries in arbitrary order.
    pub fn iter(&self) -> hash_map::Iter<'_, Bytes, ValueContainer> {
        self.entries.iter()
    }

    /// Checks the storage invariants every entry must satisfy.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        match self
            .entries
            .iter()
            .find(|(_, container)| container.is_empty_collection())
        {
            Some((key, container)) => Err(SnapshotError::EmptyCollection {
                key: key.clone(),
                kind: container.kind(),
            }),
            None => Ok(()),
        }
    }

    /// Consumes the snapshot, returning the raw mapping.
    pub fn into_inner(self) -> HashMap<Bytes, ValueContainer> {
        self.entries
    }
}

impl From<HashMap<Bytes, ValueContainer>> for Snapshot {
    fn from(entries: HashMap<Bytes, ValueContainer>) -> Self {
        Self { entries }
    }
}

impl FromIterator<(Bytes, ValueContainer)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (Bytes, ValueContainer)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Snapshot {
    type Item = (Bytes, ValueContainer);
    type IntoIter = hash_map::IntoIter<Bytes, ValueContainer>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::value::Value;
    use std::collections::{HashSet, VecDeque};

    #[test]
    fn test_validate_accepts_populated_entries() {
        let snapshot: Snapshot = [
            (
                Bytes::from("name"),
                ValueContainer::persistent(Value::String(Bytes::new())),
            ),
            (
                Bytes::from("tags"),
                ValueContainer::persistent(Value::Set(HashSet::from([Bytes::from("a")]))),
            ),
        ]
        .into_iter()
        .collect();

        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_collection() {
        let mut snapshot = Snapshot::new();
        snapshot.insert(
            Bytes::from("queue"),
            ValueContainer::persistent(Value::List(VecDeque::new())),
        );

        let err = snapshot.validate().unwrap_err();
        assert_eq!(
            err,
            SnapshotError::EmptyCollection {
                key: Bytes::from("queue"),
                kind: ValueKind::List,
            }
        );
        assert!(err.to_string().contains("empty list"));
    }

    #[test]
    fn test_export_and_reload_raw_mapping() {
        let mut snapshot = Snapshot::new();
        snapshot.insert(
            Bytes::from("name"),
            ValueContainer::persistent(Value::String(Bytes::from("Ariz"))),
        );
        snapshot.insert(
            Bytes::from("queue"),
            ValueContainer::persistent(Value::List(VecDeque::from([Bytes::from("job")]))),
        );

        let mut kinds: Vec<_> = snapshot
            .iter()
            .map(|(key, container)| (key.clone(), container.kind()))
            .collect();
        kinds.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            kinds,
            vec![
                (Bytes::from("name"), ValueKind::String),
                (Bytes::from("queue"), ValueKind::List),
            ]
        );

        let raw = snapshot.clone().into_inner();
        assert_eq!(raw.len(), 2);

        let reloaded = Snapshot::from(raw);
        assert_eq!(reloaded, snapshot);
        assert_eq!(
            reloaded.get(b"name").map(|c| &c.data),
            Some(&Value::String(Bytes::from("Ariz")))
        );
        assert_eq!(reloaded.into_iter().count(), 2);
    }
}
