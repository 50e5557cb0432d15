// ============================================================================
// Kv - transactional access layer
// ============================================================================
//
// One handle per store. Reads go straight to a snapshot (latest, explicit
// version, or a caller-supplied one); writes go through the retrying
// transaction executor.
//
// ============================================================================

mod mutation;
mod range;
mod reader;

use crate::connection::StoreConfig;
use crate::core::Result;
use crate::storage::{Driver, InMemoryStorage, Storage, Transaction};
use crate::transaction::TransactionExecutor;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{Level, event};

pub struct Kv {
    storage: Arc<dyn Storage>,
    executor: TransactionExecutor,
}

impl Kv {
    /// Open the store described by `config` through `driver`.
    ///
    /// # Examples
    ///
    /// ```
    /// use txnkv::{Kv, MemoryDriver, StoreConfig};
    ///
    /// # tokio_test::block_on(async {
    /// let kv = Kv::open(&MemoryDriver, StoreConfig::new("127.0.0.1:2379")).await?;
    /// kv.set(b"user:1", b"alice").await?;
    /// assert_eq!(kv.get(b"user:1").await?, Some(b"alice".to_vec()));
    /// kv.close().await?;
    /// # Ok::<(), txnkv::KvError>(())
    /// # }).unwrap();
    /// ```
    pub async fn open(driver: &dyn Driver, config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let url = config.store_url();
        let storage = driver.open(&url).await?;
        event!(Level::INFO, url = %url, txn_retry = config.txn_retry, "store opened");
        Self::with_storage(storage, config)
    }

    /// Wrap an already opened backend
    pub fn with_storage(storage: Arc<dyn Storage>, config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let executor = TransactionExecutor::new(Arc::clone(&storage), &config);
        Ok(Self { storage, executor })
    }

    /// Fresh in-memory store
    pub fn in_memory(config: StoreConfig) -> Result<Self> {
        Self::with_storage(Arc::new(InMemoryStorage::new()), config)
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn txn_retry(&self) -> usize {
        self.executor.txn_retry()
    }

    pub fn set_txn_retry(&self, retries: usize) {
        self.executor.set_txn_retry(retries);
    }

    /// Run `work` in a retried transaction.
    ///
    /// See [`TransactionExecutor::run`]: `work` may run more than once and
    /// gets a new transaction each time.
    ///
    /// ```
    /// use txnkv::{Kv, KvError, StoreConfig};
    ///
    /// # tokio_test::block_on(async {
    /// let kv = Kv::in_memory(StoreConfig::default())?;
    /// let written = kv
    ///     .run_in_transaction(|txn| {
    ///         Box::pin(async move {
    ///             txn.set(b"a", b"1").await?;
    ///             txn.set(b"b", b"2").await?;
    ///             Ok::<_, KvError>(2)
    ///         })
    ///     })
    ///     .await?;
    /// assert_eq!(written, 2);
    /// # Ok::<(), KvError>(())
    /// # }).unwrap();
    /// ```
    pub async fn run_in_transaction<T, F>(&self, work: F) -> Result<T>
    where
        T: Send,
        F: for<'t> FnMut(&'t mut dyn Transaction) -> BoxFuture<'t, Result<T>> + Send,
    {
        self.executor.run(work).await
    }

    /// Release the store; a second call fails
    pub async fn close(&self) -> Result<()> {
        self.storage.close().await
    }
}
