use super::cursor::ScopedIter;
use crate::core::Result;
use crate::storage::Transaction;

/// Delete every key in `[start, end]` seen by the transaction's snapshot,
/// at most `limit` of them (`0` means no limit). Returns the number deleted.
///
/// The deletes are buffered in `txn`; committing is up to the caller.
pub async fn delete_walk(
    txn: &mut dyn Transaction,
    start: &[u8],
    end: Option<&[u8]>,
    limit: u64,
) -> Result<u64> {
    let snapshot = txn.snapshot();
    let mut iter = ScopedIter::seek(snapshot.as_ref(), start).await?;

    let mut limit = if limit == 0 { u64::MAX } else { limit };
    let mut deleted = 0u64;

    while limit > 0 && iter.valid() {
        let key = iter.key().to_vec();
        if let Some(end) = end
            && key.as_slice() > end
        {
            break;
        }

        txn.delete(&key).await?;
        deleted += 1;
        limit -= 1;

        iter.next().await?;
    }

    Ok(deleted)
}
