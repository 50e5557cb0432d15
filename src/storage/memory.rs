// ============================================================================
// In-Memory MVCC Storage
// ============================================================================
//
// Reference backend for the storage contract:
// - Versioned keyspace kept in a persistent map (O(1) snapshot clones)
// - Logical clock; every non-empty commit gets the next version
// - Snapshot isolation, first committer wins on write-write conflicts
//
// ============================================================================

use super::engine::{Driver, KvIterator, Snapshot, Storage, Transaction};
use super::mvcc::{VersionChain, VersionMap, first_visible};
use crate::core::{Key, KvError, Result, Value, Version};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{Level, event};

struct StoreState {
    data: VersionMap,
    clock: u64,
}

struct Shared {
    state: RwLock<StoreState>,
    closed: AtomicBool,
}

impl Shared {
    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(KvError::StoreClosed);
        }
        Ok(())
    }
}

/// In-memory MVCC key-value store.
///
/// Cloning is cheap and yields another handle to the same store.
#[derive(Clone)]
pub struct InMemoryStorage {
    shared: Arc<Shared>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(StoreState {
                    data: VersionMap::new(),
                    clock: 0,
                }),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Number of keys with at least one version, tombstoned keys included
    pub async fn key_count(&self) -> usize {
        self.shared.state.read().await.data.len()
    }

    async fn snapshot_at(&self, version: Version) -> Result<MemorySnapshot> {
        self.shared.ensure_open()?;
        let state = self.shared.state.read().await;
        Ok(MemorySnapshot {
            data: state.data.clone(),
            version: version.resolve(state.clock),
        })
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn snapshot(&self, version: Version) -> Result<Arc<dyn Snapshot>> {
        Ok(Arc::new(self.snapshot_at(version).await?))
    }

    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        let snapshot = self.snapshot_at(Version::Latest).await?;
        Ok(Box::new(MemoryTransaction {
            shared: Arc::clone(&self.shared),
            start_version: snapshot.version,
            snapshot: Arc::new(snapshot),
            writes: BTreeMap::new(),
        }))
    }

    async fn current_version(&self) -> Result<u64> {
        self.shared.ensure_open()?;
        Ok(self.shared.state.read().await.clock)
    }

    async fn close(&self) -> Result<()> {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return Err(KvError::StoreClosed);
        }
        event!(Level::INFO, "memory store closed");
        Ok(())
    }
}

pub struct MemorySnapshot {
    data: VersionMap,
    version: u64,
}

#[async_trait]
impl Snapshot for MemorySnapshot {
    fn version(&self) -> u64 {
        self.version
    }

    async fn get(&self, key: &[u8]) -> Result<Value> {
        self.data
            .get(key)
            .and_then(|chain| chain.value_at(self.version))
            .cloned()
            .ok_or(KvError::NotFound)
    }

    async fn batch_get(&self, keys: &[Key]) -> Result<HashMap<Key, Value>> {
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = self
                .data
                .get(key.as_slice())
                .and_then(|chain| chain.value_at(self.version))
            {
                found.insert(key.clone(), value.clone());
            }
        }
        Ok(found)
    }

    async fn seek(&self, key: &[u8]) -> Result<Box<dyn KvIterator>> {
        let current = first_visible(&self.data, Bound::Included(key), self.version);
        Ok(Box::new(MemoryIterator {
            data: self.data.clone(),
            version: self.version,
            current,
            closed: false,
        }))
    }
}

pub struct MemoryIterator {
    data: VersionMap,
    version: u64,
    current: Option<(Key, Value)>,
    closed: bool,
}

#[async_trait]
impl KvIterator for MemoryIterator {
    fn valid(&self) -> bool {
        !self.closed && self.current.is_some()
    }

    fn key(&self) -> &[u8] {
        self.current.as_ref().map(|(key, _)| key.as_slice()).unwrap_or(&[])
    }

    fn value(&self) -> &[u8] {
        self.current
            .as_ref()
            .map(|(_, value)| value.as_slice())
            .unwrap_or(&[])
    }

    async fn next(&mut self) -> Result<()> {
        if self.closed {
            return Err(KvError::Backend("iterator is closed".into()));
        }
        if let Some((key, _)) = self.current.take() {
            self.current = first_visible(&self.data, Bound::Excluded(key.as_slice()), self.version);
        }
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
        self.current = None;
    }
}

pub struct MemoryTransaction {
    shared: Arc<Shared>,
    start_version: u64,
    snapshot: Arc<MemorySnapshot>,
    /// `None` buffers a delete
    writes: BTreeMap<Key, Option<Value>>,
}

#[async_trait]
impl Transaction for MemoryTransaction {
    fn start_version(&self) -> u64 {
        self.start_version
    }

    async fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.writes.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    async fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.writes.insert(key.to_vec(), None);
        Ok(())
    }

    fn snapshot(&self) -> Arc<dyn Snapshot> {
        self.snapshot.clone()
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryTransaction {
            shared,
            start_version,
            writes,
            ..
        } = *self;

        shared.ensure_open()?;
        if writes.is_empty() {
            return Ok(());
        }

        let mut state = shared.state.write().await;

        for key in writes.keys() {
            if let Some(committed) = state
                .data
                .get(key)
                .and_then(VersionChain::latest_commit_version)
                && committed > start_version
            {
                event!(
                    Level::DEBUG,
                    start_version,
                    conflict_version = committed,
                    "memory store write conflict"
                );
                return Err(KvError::WriteConflict {
                    key: key.clone(),
                    start_version,
                    conflict_version: committed,
                });
            }
        }

        state.clock += 1;
        let commit_version = state.clock;
        let write_count = writes.len();
        for (key, value) in writes {
            let mut chain = state.data.get(&key).cloned().unwrap_or_default();
            chain.push(commit_version, value);
            state.data.insert(key, chain);
        }

        event!(
            Level::DEBUG,
            start_version,
            commit_version,
            writes = write_count,
            "memory store commit"
        );
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        event!(
            Level::DEBUG,
            start_version = self.start_version,
            discarded = self.writes.len(),
            "memory store rollback"
        );
        Ok(())
    }
}

/// Opens a fresh [`InMemoryStorage`] for `tikv://` and `memory://` URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryDriver;

impl MemoryDriver {
    const SCHEMES: [&'static str; 2] = ["tikv", "memory"];
}

#[async_trait]
impl Driver for MemoryDriver {
    async fn open(&self, url: &str) -> Result<Arc<dyn Storage>> {
        let scheme = url.split_once("://").map(|(scheme, _)| scheme);
        if !scheme.is_some_and(|scheme| Self::SCHEMES.contains(&scheme)) {
            return Err(KvError::UnsupportedBackend(url.to_string()));
        }
        event!(Level::INFO, url, "opening memory store");
        Ok(Arc::new(InMemoryStorage::new()))
    }
}
