// ============================================================================
// Range Cursor
// ============================================================================
//
// Boundary-precise forward walk over a snapshot iterator. The backend
// iterator only knows where it started; the walk decides where it stops:
//
//   1. read the current entry
//   2. excluded start key      -> skip (not counted)
//   3. excluded end key        -> stop
//   4. key beyond end          -> stop
//   5. offset left             -> skip (not collected)
//   6. otherwise collect/count, limit - 1
//
// Key and count walks advance right after step 1. Walks that read values
// advance only once the entry has passed the bound checks, so they never
// step past the end key.
//
// ============================================================================

use crate::core::{Key, Result};
use crate::storage::{KvIterator, Snapshot};
use std::ops::{Deref, DerefMut};

/// Iterator that is closed when it goes out of scope, whichever way the
/// enclosing walk exits.
pub struct ScopedIter {
    inner: Box<dyn KvIterator>,
}

impl ScopedIter {
    pub fn new(inner: Box<dyn KvIterator>) -> Self {
        Self { inner }
    }

    pub async fn seek(snapshot: &dyn Snapshot, start: &[u8]) -> Result<Self> {
        Ok(Self::new(snapshot.seek(start).await?))
    }
}

impl Deref for ScopedIter {
    type Target = dyn KvIterator;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl DerefMut for ScopedIter {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.as_mut()
    }
}

impl Drop for ScopedIter {
    fn drop(&mut self) {
        self.inner.close();
    }
}

/// What a walk produces for every entry it accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    #[default]
    Keys,
    /// Tally only; nothing is materialized
    Count,
    Values,
    /// Interleaved key, value, key, value, ...
    Pairs,
}

impl ScanMode {
    fn reads_value(self) -> bool {
        matches!(self, ScanMode::Values | ScanMode::Pairs)
    }
}

/// Parameters of one walk
#[derive(Debug, Clone, Copy)]
pub struct RangeScan<'a> {
    pub start: &'a [u8],
    pub include_start: bool,
    /// `None` walks to the end of the keyspace
    pub end: Option<&'a [u8]>,
    pub include_end: bool,
    pub offset: u64,
    /// `0` yields nothing
    pub limit: u64,
    pub mode: ScanMode,
}

impl<'a> RangeScan<'a> {
    /// Inclusive on both ends, no offset, unlimited, keys
    pub fn new(start: &'a [u8], end: Option<&'a [u8]>) -> Self {
        Self {
            start,
            include_start: true,
            end,
            include_end: true,
            offset: 0,
            limit: u64::MAX,
            mode: ScanMode::Keys,
        }
    }

    pub fn frontier(mut self, include_start: bool, include_end: bool) -> Self {
        self.include_start = include_start;
        self.include_end = include_end;
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn mode(mut self, mode: ScanMode) -> Self {
        self.mode = mode;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutput {
    /// Empty in [`ScanMode::Count`]
    pub items: Vec<Key>,
    /// Entries accepted by the walk, in every mode
    pub count: u64,
}

pub async fn scan(snapshot: &dyn Snapshot, range: &RangeScan<'_>) -> Result<ScanOutput> {
    let mut iter = ScopedIter::seek(snapshot, range.start).await?;
    let mut offset = range.offset;
    let mut limit = range.limit;
    let mut output = ScanOutput::default();

    let advance_early = !range.mode.reads_value();

    while limit > 0 && iter.valid() {
        let key = iter.key().to_vec();
        let value = range.mode.reads_value().then(|| iter.value().to_vec());

        if advance_early {
            iter.next().await?;
        }

        if let Some(end) = range.end
            && ((!range.include_end && key.as_slice() == end) || key.as_slice() > end)
        {
            break;
        }

        // an excluded start key does not consume the offset
        let excluded = !range.include_start && key.as_slice() == range.start;
        if !excluded && offset > 0 {
            offset -= 1;
        } else if !excluded {
            match range.mode {
                ScanMode::Count => {}
                ScanMode::Keys => output.items.push(key),
                ScanMode::Values => output.items.extend(value),
                ScanMode::Pairs => {
                    output.items.push(key);
                    output.items.extend(value);
                }
            }
            output.count += 1;
            limit -= 1;
        }

        if !advance_early {
            iter.next().await?;
        }
    }

    Ok(output)
}
