#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use txnkv::{
    InMemoryStorage, Kv, KvError, Result, Snapshot, Storage, StoreConfig, Transaction, Version,
};

/// Failures to inject, consumed one at a time
#[derive(Default)]
pub struct Faults {
    pub begin: AtomicUsize,
    pub commit: AtomicUsize,
    pub rollback: AtomicUsize,
    /// Injected commit/rollback failures are retryable unless cleared
    pub permanent: AtomicBool,
    pub begins: AtomicUsize,
    pub commits: AtomicUsize,
}

impl Faults {
    fn take(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }

    fn injected(&self, what: &str) -> KvError {
        if self.permanent.load(Ordering::SeqCst) {
            KvError::Backend(format!("injected {what} failure"))
        } else {
            KvError::Transient(format!("injected {what} failure"))
        }
    }

    pub fn fail_commits(&self, times: usize) {
        self.commit.store(times, Ordering::SeqCst);
    }

    pub fn fail_rollbacks(&self, times: usize) {
        self.rollback.store(times, Ordering::SeqCst);
    }

    pub fn fail_begins(&self, times: usize) {
        self.begin.store(times, Ordering::SeqCst);
    }

    pub fn make_permanent(&self) {
        self.permanent.store(true, Ordering::SeqCst);
    }
}

/// Memory store whose transactions fail on demand
pub struct FlakyStorage {
    inner: InMemoryStorage,
    pub faults: Arc<Faults>,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self {
            inner: InMemoryStorage::new(),
            faults: Arc::new(Faults::default()),
        }
    }
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn snapshot(&self, version: Version) -> Result<Arc<dyn Snapshot>> {
        self.inner.snapshot(version).await
    }

    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        self.faults.begins.fetch_add(1, Ordering::SeqCst);
        if Faults::take(&self.faults.begin) {
            return Err(KvError::Backend("pd unreachable".into()));
        }
        Ok(Box::new(FlakyTransaction {
            inner: self.inner.begin().await?,
            faults: Arc::clone(&self.faults),
        }))
    }

    async fn current_version(&self) -> Result<u64> {
        self.inner.current_version().await
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}

struct FlakyTransaction {
    inner: Box<dyn Transaction>,
    faults: Arc<Faults>,
}

#[async_trait]
impl Transaction for FlakyTransaction {
    fn start_version(&self) -> u64 {
        self.inner.start_version()
    }

    async fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.inner.set(key, value).await
    }

    async fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.inner.delete(key).await
    }

    fn snapshot(&self) -> Arc<dyn Snapshot> {
        self.inner.snapshot()
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        if Faults::take(&self.faults.commit) {
            let err = self.faults.injected("commit");
            self.inner.rollback().await?;
            return Err(err);
        }
        self.faults.commits.fetch_add(1, Ordering::SeqCst);
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        if Faults::take(&self.faults.rollback) {
            let err = self.faults.injected("rollback");
            self.inner.rollback().await?;
            return Err(err);
        }
        self.inner.rollback().await
    }
}

/// Store with immediate retries, so tests do not sleep
pub fn config(retries: usize) -> StoreConfig {
    StoreConfig::default()
        .txn_retry(retries)
        .backoff_on_retry(false)
}

pub fn memory_kv() -> Kv {
    Kv::in_memory(config(3)).unwrap()
}

pub fn flaky_kv(retries: usize) -> (Kv, Arc<Faults>) {
    flaky_kv_with(config(retries))
}

pub fn flaky_kv_with(config: StoreConfig) -> (Kv, Arc<Faults>) {
    let storage = FlakyStorage::new();
    let faults = Arc::clone(&storage.faults);
    (Kv::with_storage(Arc::new(storage), config).unwrap(), faults)
}

pub async fn seed(kv: &Kv, pairs: &[(&str, &str)]) {
    for (key, value) in pairs {
        kv.set(key.as_bytes(), value.as_bytes()).await.unwrap();
    }
}

pub fn keys(items: &[&str]) -> Vec<Vec<u8>> {
    items.iter().map(|item| item.as_bytes().to_vec()).collect()
}
