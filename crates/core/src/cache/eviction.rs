//! Entry-count cap for a store.

use super::CacheStorage;
use crate::Error;

/// Delete oldest entries of `store` until it holds at most `max_items`.
///
/// One key is deleted per iteration and the key list is re-read before the
/// next, so entries added concurrently are counted. This is not atomic: a
/// writer racing the loop can leave the store briefly over or under the cap,
/// and the next write's pass corrects it.
///
/// Returns the number of entries removed.
pub async fn enforce_limit(storage: &dyn CacheStorage, store: &str, max_items: usize) -> Result<u64, Error> {
    let mut deleted = 0u64;

    loop {
        let keys = storage.keys(store).await?;
        if keys.len() <= max_items {
            break;
        }

        let oldest = &keys[0];
        if storage.delete(store, oldest).await? {
            deleted += 1;
        }
        tracing::debug!(store, url = %oldest.url(), count = keys.len(), max_items, "evicted oldest entry");
    }

    Ok(deleted)
}
