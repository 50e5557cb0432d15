pub mod cursor;
pub mod deleter;

pub use cursor::{RangeScan, ScanMode, ScanOutput, ScopedIter, scan};
pub use deleter::delete_walk;
