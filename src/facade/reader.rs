use super::Kv;
use crate::core::{Handle, Key, ReadView, Result, Value, Version};
use crate::storage::Snapshot;
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

/// A snapshot opened for the call, or one lent by the caller
pub(crate) enum SnapshotRef<'a> {
    Owned(Arc<dyn Snapshot>),
    Borrowed(&'a dyn Snapshot),
}

impl<'a> Deref for SnapshotRef<'a> {
    type Target = dyn Snapshot + 'a;

    fn deref(&self) -> &Self::Target {
        match self {
            SnapshotRef::Owned(snapshot) => snapshot.as_ref(),
            SnapshotRef::Borrowed(snapshot) => *snapshot,
        }
    }
}

/// Not-found is an empty result, every other failure propagates.
async fn read_point(snapshot: &dyn Snapshot, key: &[u8]) -> Result<Option<Value>> {
    match snapshot.get(key).await {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

impl Kv {
    pub(crate) async fn resolve_snapshot<'a>(&self, view: ReadView<'a>) -> Result<SnapshotRef<'a>> {
        match view {
            ReadView::Latest => Ok(SnapshotRef::Owned(
                self.storage.snapshot(Version::Latest).await?,
            )),
            ReadView::Version(version) => Ok(SnapshotRef::Owned(
                self.storage.snapshot(Version::At(version)).await?,
            )),
            ReadView::Handle(handle) => Ok(SnapshotRef::Borrowed(handle.as_snapshot()?)),
        }
    }

    /// Snapshot of everything committed so far; the caller decides how long
    /// to keep it
    pub async fn newest_snapshot(&self) -> Result<Arc<dyn Snapshot>> {
        self.storage.snapshot(Version::Latest).await
    }

    pub async fn get(&self, key: &[u8]) -> Result<Option<Value>> {
        let snapshot = self.resolve_snapshot(ReadView::Latest).await?;
        read_point(&*snapshot, key).await
    }

    pub async fn get_with_version(&self, key: &[u8], version: u64) -> Result<Option<Value>> {
        let snapshot = self.resolve_snapshot(ReadView::Version(version)).await?;
        read_point(&*snapshot, key).await
    }

    /// Fails with `BackendType` unless `handle` is a snapshot
    pub async fn get_with_snapshot(&self, key: &[u8], handle: Handle<'_>) -> Result<Option<Value>> {
        let snapshot = self.resolve_snapshot(ReadView::Handle(handle)).await?;
        read_point(&*snapshot, key).await
    }

    /// Values of the keys that exist; missing keys are left out
    pub async fn mget(&self, keys: &[Key]) -> Result<HashMap<Key, Value>> {
        self.mget_in(ReadView::Latest, keys).await
    }

    pub async fn mget_with_version(&self, keys: &[Key], version: u64) -> Result<HashMap<Key, Value>> {
        self.mget_in(ReadView::Version(version), keys).await
    }

    pub async fn mget_with_snapshot(
        &self,
        keys: &[Key],
        handle: Handle<'_>,
    ) -> Result<HashMap<Key, Value>> {
        self.mget_in(ReadView::Handle(handle), keys).await
    }

    async fn mget_in(&self, view: ReadView<'_>, keys: &[Key]) -> Result<HashMap<Key, Value>> {
        let snapshot = self.resolve_snapshot(view).await?;
        snapshot.batch_get(keys).await
    }
}
