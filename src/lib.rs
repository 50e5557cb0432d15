// ============================================================================
// txnkv Library
// ============================================================================
//
// Retrying transactional access layer over snapshot-isolated MVCC
// key-value stores:
// - point / batch reads at the latest or an explicit version
// - boundary-precise range scans (frontier, offset, limit, count-only)
// - set / delete / range delete in retried transactions
//
// ============================================================================

pub mod connection;
pub mod core;
pub mod facade;
pub mod range;
pub mod storage;
pub mod transaction;

pub use connection::StoreConfig;
pub use crate::core::{Handle, Key, KvError, ReadView, Result, Value, Version};
pub use facade::Kv;
pub use range::{RangeScan, ScanMode, ScanOutput};
pub use storage::{
    Driver, InMemoryStorage, KvIterator, MemoryDriver, Snapshot, Storage, Transaction,
};
pub use transaction::{BackoffPolicy, TransactionExecutor};
