use crate::core::{Key, KvError, Result, Value, Version};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Opens a storage backend from a connection URL.
#[async_trait]
pub trait Driver: Send + Sync {
    async fn open(&self, url: &str) -> Result<Arc<dyn Storage>>;
}

/// Storage backend - the four capabilities the access layer is built on
#[async_trait]
pub trait Storage: Send + Sync {
    /// Open a read-only view fixed at `version`
    async fn snapshot(&self, version: Version) -> Result<Arc<dyn Snapshot>>;

    /// Begin a transaction whose reads are fixed at the current version
    async fn begin(&self) -> Result<Box<dyn Transaction>>;

    /// Newest committed version
    async fn current_version(&self) -> Result<u64>;

    /// Release the backend. Must be called exactly once.
    async fn close(&self) -> Result<()>;

    /// Whether a failed commit or rollback is worth a fresh attempt
    fn is_retryable_error(&self, err: &KvError) -> bool {
        err.is_retryable()
    }
}

/// Immutable, consistent view of the keyspace
#[async_trait]
pub trait Snapshot: Send + Sync {
    fn version(&self) -> u64;

    /// Fails with [`KvError::NotFound`] on a miss
    async fn get(&self, key: &[u8]) -> Result<Value>;

    /// Found keys only
    async fn batch_get(&self, keys: &[Key]) -> Result<HashMap<Key, Value>>;

    /// Position a forward iterator at the first key `>= key`
    async fn seek(&self, key: &[u8]) -> Result<Box<dyn KvIterator>>;
}

/// Forward-only cursor over a snapshot.
///
/// The iterator does not know about any end bound; callers stop the walk.
/// `key` and `value` are only meaningful while `valid` returns true.
#[async_trait]
pub trait KvIterator: Send {
    fn valid(&self) -> bool;

    fn key(&self) -> &[u8];

    fn value(&self) -> &[u8];

    async fn next(&mut self) -> Result<()>;

    fn close(&mut self);
}

/// Mutable unit of work with its own start snapshot and a write buffer.
///
/// `commit` and `rollback` consume the transaction.
#[async_trait]
pub trait Transaction: Send {
    fn start_version(&self) -> u64;

    async fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    async fn delete(&mut self, key: &[u8]) -> Result<()>;

    /// Snapshot fixed at transaction start; does not see buffered writes
    fn snapshot(&self) -> Arc<dyn Snapshot>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}
