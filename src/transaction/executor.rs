// ============================================================================
// Transaction Executor
// ============================================================================
//
// Runs a unit of work inside a transaction:
//   begin -> work -> commit            (success)
//   begin -> work fails -> rollback    (work error surfaces)
// Retryable commit/rollback failures start over with a fresh transaction
// and a fresh invocation of the work, up to the configured retry count.
//
// ============================================================================

use super::BackoffPolicy;
use crate::connection::StoreConfig;
use crate::core::{KvError, Result};
use crate::storage::{Storage, Transaction};
use futures::future::BoxFuture;
use log::warn;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{Instrument, Level, event, info_span};

pub struct TransactionExecutor {
    storage: Arc<dyn Storage>,
    txn_retry: AtomicUsize,
    backoff: BackoffPolicy,
    backoff_on_retry: bool,
}

impl TransactionExecutor {
    pub fn new(storage: Arc<dyn Storage>, config: &StoreConfig) -> Self {
        Self {
            storage,
            txn_retry: AtomicUsize::new(config.txn_retry),
            backoff: config.backoff_policy(),
            backoff_on_retry: config.backoff_on_retry,
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn txn_retry(&self) -> usize {
        self.txn_retry.load(Ordering::SeqCst)
    }

    /// Takes effect for retry loops entered after the call
    pub fn set_txn_retry(&self, retries: usize) {
        self.txn_retry.store(retries, Ordering::SeqCst);
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        self.backoff
    }

    /// Run `work` in a transaction and commit it.
    ///
    /// `work` may be called several times, each time with a new transaction,
    /// when a commit or rollback fails with a retryable error. It must not
    /// rely on running once: state it captures has to be cloned into each
    /// attempt rather than mutated across attempts. Only the result of the
    /// attempt that committed is returned.
    ///
    /// A failure to begin a transaction is returned without retrying.
    pub async fn run<T, F>(&self, mut work: F) -> Result<T>
    where
        T: Send,
        F: for<'t> FnMut(&'t mut dyn Transaction) -> BoxFuture<'t, Result<T>> + Send,
    {
        let mut retries_left = self.txn_retry();
        let mut attempt: u32 = 0;

        loop {
            let mut txn = self.storage.begin().await?;
            let txn_id = txn.start_version();

            let outcome = work(&mut *txn)
                .instrument(info_span!("txnkv.txn", attempt, start_version = txn_id))
                .await;

            match outcome {
                Ok(value) => match txn.commit().await {
                    Ok(()) => return Ok(value),
                    Err(err) => {
                        if !self.should_retry(&err, retries_left) {
                            return Err(err);
                        }
                        warn!("txn {} commit retry, err: {}", txn_id, err);
                    }
                },
                Err(work_err) => match txn.rollback().await {
                    Ok(()) => return Err(work_err),
                    Err(err) => {
                        if !self.should_retry(&err, retries_left) {
                            return Err(err);
                        }
                        warn!(
                            "txn {} rollback retry, err: {} (work failed with: {})",
                            txn_id, err, work_err
                        );
                    }
                },
            }

            retries_left -= 1;
            if self.backoff_on_retry {
                let slept = self.backoff.backoff(attempt).await;
                event!(
                    Level::DEBUG,
                    attempt,
                    backoff_ms = slept.as_millis() as u64,
                    "txn backoff"
                );
            }
            attempt += 1;
        }
    }

    fn should_retry(&self, err: &KvError, retries_left: usize) -> bool {
        if !self.storage.is_retryable_error(err) {
            return false;
        }
        if retries_left == 0 {
            warn!("txn retries exhausted, err: {}", err);
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Version;
    use crate::storage::{InMemoryStorage, Snapshot};

    fn executor(storage: &InMemoryStorage, retries: usize) -> TransactionExecutor {
        let config = StoreConfig::default()
            .txn_retry(retries)
            .backoff_on_retry(false);
        TransactionExecutor::new(Arc::new(storage.clone()), &config)
    }

    async fn read_counter(snapshot: Arc<dyn Snapshot>) -> Result<u64> {
        match snapshot.get(b"counter").await {
            Ok(raw) => Ok(String::from_utf8_lossy(&raw).parse().unwrap_or(0)),
            Err(err) if err.is_not_found() => Ok(0),
            Err(err) => Err(err),
        }
    }

    #[tokio::test]
    async fn test_run_commits_work() {
        let storage = InMemoryStorage::new();
        let executor = executor(&storage, 3);

        let written = executor
            .run(|txn| {
                Box::pin(async move {
                    txn.set(b"a", b"1").await?;
                    Ok::<_, KvError>(1usize)
                })
            })
            .await;
        assert_eq!(written, Ok(1));

        let snapshot = storage.snapshot(Version::Latest).await.unwrap();
        assert_eq!(snapshot.get(b"a").await.unwrap(), b"1".to_vec());
    }

    #[tokio::test]
    async fn test_work_error_rolls_back() {
        let storage = InMemoryStorage::new();
        let executor = executor(&storage, 3);

        let result: Result<()> = executor
            .run(|txn| {
                Box::pin(async move {
                    txn.set(b"a", b"1").await?;
                    Err(KvError::Backend("work failed".into()))
                })
            })
            .await;
        assert_eq!(result, Err(KvError::Backend("work failed".into())));

        let snapshot = storage.snapshot(Version::Latest).await.unwrap();
        assert!(snapshot.get(b"a").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_retries_after_write_conflict() {
        let storage = InMemoryStorage::new();
        let executor = executor(&storage, 2);
        let calls = Arc::new(AtomicUsize::new(0));

        let result = executor
            .run(|txn| {
                let storage = storage.clone();
                let calls = calls.clone();
                Box::pin(async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        let mut other = storage.begin().await?;
                        other.set(b"counter", b"100").await?;
                        other.commit().await?;
                    }
                    let next = read_counter(txn.snapshot()).await? + 1;
                    txn.set(b"counter", next.to_string().as_bytes()).await?;
                    Ok::<_, KvError>(next)
                })
            })
            .await;

        assert_eq!(result, Ok(101));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_retries_tries_once() {
        let storage = InMemoryStorage::new();
        let executor = executor(&storage, 0);
        let calls = Arc::new(AtomicUsize::new(0));

        let result = executor
            .run(|txn| {
                let storage = storage.clone();
                let calls = calls.clone();
                Box::pin(async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let mut other = storage.begin().await?;
                    other.set(b"k", b"other").await?;
                    other.commit().await?;
                    txn.set(b"k", b"mine").await?;
                    Ok::<_, KvError>(())
                })
            })
            .await;

        assert!(matches!(result, Err(KvError::WriteConflict { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_executor_takes_settings_from_config() {
        let storage = InMemoryStorage::new();
        let config = StoreConfig::default().backoff(3, 30);
        let executor = TransactionExecutor::new(Arc::new(storage.clone()), &config);

        assert_eq!(executor.backoff_policy(), BackoffPolicy::new(3, 30));
        assert_eq!(executor.txn_retry(), config.txn_retry);

        executor
            .run(|txn| Box::pin(async move { txn.set(b"a", b"1").await }))
            .await
            .unwrap();
        assert_eq!(executor.storage().current_version().await, Ok(1));
    }

    #[test]
    fn test_retry_count_is_mutable() {
        let storage = InMemoryStorage::new();
        let executor = executor(&storage, 10);
        assert_eq!(executor.txn_retry(), 10);
        executor.set_txn_retry(1);
        assert_eq!(executor.txn_retry(), 1);
    }
}
