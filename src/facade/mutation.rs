use super::Kv;
use crate::core::{Handle, Key, Result, Value};
use crate::range::delete_walk;
use crate::storage::Transaction;
use std::collections::HashMap;
use std::sync::Arc;

async fn write_pairs(txn: &mut dyn Transaction, pairs: &HashMap<Key, Value>) -> Result<usize> {
    for (key, value) in pairs {
        txn.set(key, value).await?;
    }
    Ok(pairs.len())
}

/// Counts only the keys visible in the transaction's snapshot. A failed
/// existence check counts the key as absent; the delete is issued anyway.
async fn delete_keys(txn: &mut dyn Transaction, keys: &[Key]) -> Result<usize> {
    let snapshot = txn.snapshot();
    let mut deleted = 0;

    for key in keys {
        if snapshot.get(key).await.is_ok() {
            deleted += 1;
        }
        txn.delete(key).await?;
    }
    Ok(deleted)
}

impl Kv {
    pub async fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let (key, value) = (key.to_vec(), value.to_vec());
        self.run_in_transaction(move |txn| {
            let (key, value) = (key.clone(), value.clone());
            Box::pin(async move { txn.set(&key, &value).await })
        })
        .await
    }

    /// Write every pair in one transaction; returns the number of pairs
    pub async fn mset(&self, pairs: HashMap<Key, Value>) -> Result<usize> {
        let pairs = Arc::new(pairs);
        self.run_in_transaction(move |txn| {
            let pairs = Arc::clone(&pairs);
            Box::pin(async move { write_pairs(txn, &pairs).await })
        })
        .await
    }

    /// Delete `keys` in one transaction; returns how many of them existed
    pub async fn delete(&self, keys: &[Key]) -> Result<usize> {
        let keys: Arc<[Key]> = keys.into();
        self.run_in_transaction(move |txn| {
            let keys = Arc::clone(&keys);
            Box::pin(async move { delete_keys(txn, &keys).await })
        })
        .await
    }

    /// Delete the keys in `[start, end]`, at most `limit` (`0` = all), in
    /// a retried transaction of its own
    ///
    /// ```
    /// use txnkv::{Kv, ReadView, StoreConfig};
    ///
    /// # tokio_test::block_on(async {
    /// let kv = Kv::in_memory(StoreConfig::default())?;
    /// for key in ["a", "b", "c"] {
    ///     kv.set(key.as_bytes(), b"v").await?;
    /// }
    /// assert_eq!(kv.delete_range(b"a", Some(b"b".as_slice()), 0).await?, 2);
    /// assert_eq!(kv.delete_range(b"a", Some(b"b".as_slice()), 0).await?, 0);
    /// # Ok::<(), txnkv::KvError>(())
    /// # }).unwrap();
    /// ```
    pub async fn delete_range(&self, start: &[u8], end: Option<&[u8]>, limit: u64) -> Result<u64> {
        let start = start.to_vec();
        let end = end.map(<[u8]>::to_vec);
        self.run_in_transaction(move |txn| {
            let (start, end) = (start.clone(), end.clone());
            Box::pin(async move { delete_walk(txn, &start, end.as_deref(), limit).await })
        })
        .await
    }

    /// Same walk as [`Kv::delete_range`] inside a transaction the caller
    /// owns: nothing is committed, rolled back or retried here.
    /// Fails with `BackendType` unless `handle` is a transaction.
    pub async fn delete_range_with_txn(
        &self,
        start: &[u8],
        end: Option<&[u8]>,
        limit: u64,
        handle: Handle<'_>,
    ) -> Result<u64> {
        let txn = handle.into_transaction()?;
        delete_walk(txn, start, end, limit).await
    }
}
