/// Snapshot read tests
///
/// Point and batch reads at the latest version, an explicit version and
/// a caller-held snapshot, plus store lifecycle.
/// Run with: cargo test --test snapshot_tests

mod common;

use common::{keys, memory_kv, seed};
use txnkv::{Handle, Kv, KvError, MemoryDriver, Storage, StoreConfig};

#[tokio::test]
async fn test_get_missing_key_is_not_an_error() {
    let kv = memory_kv();
    assert_eq!(kv.get(b"nope").await, Ok(None));
    assert!(kv.mget(&keys(&["nope"])).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_mget_omits_missing_keys() {
    let kv = memory_kv();
    seed(&kv, &[("a", "1"), ("b", "2")]).await;

    let found = kv.mget(&keys(&["a", "b", "c"])).await.unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found.get(b"a".as_slice()), Some(&b"1".to_vec()));
    assert_eq!(found.get(b"b".as_slice()), Some(&b"2".to_vec()));
}

#[tokio::test]
async fn test_held_snapshot_ignores_later_writes() {
    let kv = memory_kv();
    seed(&kv, &[("a", "1")]).await;
    let snapshot = kv.newest_snapshot().await.unwrap();

    seed(&kv, &[("a", "changed"), ("b", "2")]).await;

    assert_eq!(
        kv.get_with_snapshot(b"a", Handle::Snapshot(&*snapshot)).await,
        Ok(Some(b"1".to_vec()))
    );
    let batch = kv
        .mget_with_snapshot(&keys(&["a", "b"]), Handle::Snapshot(&*snapshot))
        .await
        .unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(kv.get(b"a").await, Ok(Some(b"changed".to_vec())));
}

#[tokio::test]
async fn test_versions_advance_per_commit() {
    let kv = memory_kv();
    let v0 = kv.storage().current_version().await.unwrap();
    seed(&kv, &[("k", "1")]).await;
    let v1 = kv.storage().current_version().await.unwrap();
    seed(&kv, &[("k", "2")]).await;

    assert!(v1 > v0);
    assert_eq!(kv.get_with_version(b"k", v0).await, Ok(None));
    assert_eq!(kv.get_with_version(b"k", v1).await, Ok(Some(b"1".to_vec())));

    let batch = kv.mget_with_version(&keys(&["k"]), v1).await.unwrap();
    assert_eq!(batch.get(b"k".as_slice()), Some(&b"1".to_vec()));
}

#[tokio::test]
async fn test_batch_read_through_transaction_handle_is_rejected() {
    let kv = memory_kv();
    let mut txn = kv.storage().begin().await.unwrap();

    let err = kv
        .mget_with_snapshot(&keys(&["a"]), Handle::Transaction(&mut *txn))
        .await
        .unwrap_err();
    assert!(matches!(err, KvError::BackendType { .. }));
    txn.rollback().await.unwrap();
}

#[tokio::test]
async fn test_open_and_close_through_driver() {
    let kv = Kv::open(&MemoryDriver, StoreConfig::new("10.0.0.1:2379"))
        .await
        .unwrap();
    seed(&kv, &[("a", "1")]).await;

    assert_eq!(kv.close().await, Ok(()));
    assert_eq!(kv.close().await, Err(KvError::StoreClosed));
    assert_eq!(kv.get(b"a").await, Err(KvError::StoreClosed));
}

#[tokio::test]
async fn test_open_rejects_invalid_config() {
    let config = StoreConfig::new("");
    let err = Kv::open(&MemoryDriver, config).await.err().unwrap();
    assert!(matches!(err, KvError::Config(_)));
}
