use super::Kv;
use crate::core::{Key, ReadView, Result, Value};
use crate::range::{RangeScan, ScanMode, ScanOutput, scan};

impl Kv {
    async fn walk(&self, range: RangeScan<'_>, view: ReadView<'_>) -> Result<ScanOutput> {
        let snapshot = self.resolve_snapshot(view).await?;
        scan(&*snapshot, &range).await
    }

    /// Keys in `[start, end]`, ascending, skipping `offset` and returning at
    /// most `limit`
    ///
    /// ```
    /// use txnkv::{Kv, ReadView, StoreConfig};
    ///
    /// # tokio_test::block_on(async {
    /// let kv = Kv::in_memory(StoreConfig::default())?;
    /// for key in ["a", "b", "c", "d"] {
    ///     kv.set(key.as_bytes(), b"v").await?;
    /// }
    /// let keys = kv.range_keys(b"b", Some(b"d".as_slice()), 1, 10, ReadView::Latest).await?;
    /// assert_eq!(keys, vec![b"c".to_vec(), b"d".to_vec()]);
    /// # Ok::<(), txnkv::KvError>(())
    /// # }).unwrap();
    /// ```
    pub async fn range_keys(
        &self,
        start: &[u8],
        end: Option<&[u8]>,
        offset: u64,
        limit: u64,
        view: ReadView<'_>,
    ) -> Result<Vec<Key>> {
        self.range_keys_with_frontier(start, true, end, true, offset, limit, view)
            .await
    }

    /// Like [`Kv::range_keys`] with control over whether a key equal to
    /// `start` or `end` is part of the result
    #[allow(clippy::too_many_arguments)]
    pub async fn range_keys_with_frontier(
        &self,
        start: &[u8],
        include_start: bool,
        end: Option<&[u8]>,
        include_end: bool,
        offset: u64,
        limit: u64,
        view: ReadView<'_>,
    ) -> Result<Vec<Key>> {
        let range = RangeScan::new(start, end)
            .frontier(include_start, include_end)
            .offset(offset)
            .limit(limit);
        Ok(self.walk(range, view).await?.items)
    }

    /// Number of keys [`Kv::range_keys_with_frontier`] would return with no
    /// offset, without materializing them
    pub async fn range_keys_count(
        &self,
        start: &[u8],
        include_start: bool,
        end: Option<&[u8]>,
        include_end: bool,
        limit: u64,
        view: ReadView<'_>,
    ) -> Result<u64> {
        let range = RangeScan::new(start, end)
            .frontier(include_start, include_end)
            .limit(limit)
            .mode(ScanMode::Count);
        Ok(self.walk(range, view).await?.count)
    }

    /// Values of the keys in `[start, end]`, in key order
    pub async fn range_values(
        &self,
        start: &[u8],
        end: Option<&[u8]>,
        limit: u64,
        view: ReadView<'_>,
    ) -> Result<Vec<Value>> {
        let range = RangeScan::new(start, end)
            .limit(limit)
            .mode(ScanMode::Values);
        Ok(self.walk(range, view).await?.items)
    }

    /// Keys and values in `[start, end]` as one flat list:
    /// `[key, value, key, value, ...]`
    pub async fn range_keys_values(
        &self,
        start: &[u8],
        end: Option<&[u8]>,
        limit: u64,
        view: ReadView<'_>,
    ) -> Result<Vec<Vec<u8>>> {
        let range = RangeScan::new(start, end)
            .limit(limit)
            .mode(ScanMode::Pairs);
        Ok(self.walk(range, view).await?.items)
    }

    /// [`Kv::range_keys_values`] grouped into `(key, value)` tuples
    pub async fn range_pairs(
        &self,
        start: &[u8],
        end: Option<&[u8]>,
        limit: u64,
        view: ReadView<'_>,
    ) -> Result<Vec<(Key, Value)>> {
        let flat = self.range_keys_values(start, end, limit, view).await?;
        let mut pairs = Vec::with_capacity(flat.len() / 2);
        let mut items = flat.into_iter();
        while let (Some(key), Some(value)) = (items.next(), items.next()) {
            pairs.push((key, value));
        }
        Ok(pairs)
    }
}
