pub mod engine;
pub mod memory;
pub mod mvcc;

pub use engine::{Driver, KvIterator, Snapshot, Storage, Transaction};
pub use memory::{InMemoryStorage, MemoryDriver};
