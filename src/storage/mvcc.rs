// ============================================================================
// MVCC version chains
// ============================================================================
//
// Every key keeps its full history as a chain of committed versions, oldest
// first. A reader at version V sees the newest entry with commit_version <= V;
// a tombstone entry hides the key from that reader.
//
// ============================================================================

use crate::core::{Key, Value};
use im::{OrdMap, Vector};
use std::ops::Bound;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedValue {
    pub commit_version: u64,
    /// `None` marks a delete
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionChain {
    versions: Vector<VersionedValue>,
}

impl VersionChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit versions are appended in increasing order.
    pub fn push(&mut self, commit_version: u64, value: Option<Value>) {
        self.versions.push_back(VersionedValue {
            commit_version,
            value,
        });
    }

    pub fn visible_at(&self, version: u64) -> Option<&VersionedValue> {
        self.versions
            .iter()
            .rev()
            .find(|entry| entry.commit_version <= version)
    }

    pub fn value_at(&self, version: u64) -> Option<&Value> {
        self.visible_at(version).and_then(|entry| entry.value.as_ref())
    }

    pub fn latest_commit_version(&self) -> Option<u64> {
        self.versions.last().map(|entry| entry.commit_version)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

pub type VersionMap = OrdMap<Key, VersionChain>;

/// First key inside `lower..` that has a live value at `version`.
pub fn first_visible(
    map: &VersionMap,
    lower: Bound<&[u8]>,
    version: u64,
) -> Option<(Key, Value)> {
    map.range::<_, [u8]>((lower, Bound::Unbounded))
        .find_map(|(key, chain)| {
            chain
                .value_at(version)
                .map(|value| (key.clone(), value.clone()))
        })
}
