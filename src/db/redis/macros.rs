/// Read-through caching on top of [`Cache`](crate::db::Cache).
///
/// Looks the key up first. On a hit the cached value is returned. On a miss the
/// block is awaited, its value is queued for a background write and returned.
/// A failed cache read is logged and handled like a miss, so an unreachable
/// Redis only costs the upstream call.
///
/// # Arguments
/// * `$cache`: cache exposing `get_from_cache` and `set_in_background`.
/// * `$key`: the [`CacheKey`](crate::db::CacheKey) to read and write.
/// * `$ttl`: time-to-live of the stored value in seconds.
/// * `$block`: future computing the value on a miss; its error is propagated with `?`.
///
/// # Example
/// ```rust,ignore
/// let movies = cached!(self.cache, CacheKey::Similar(id), LIST_CACHE_TTL, async move {
///     self.fetch_list(&path, &[]).await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        let hit = match $cache.get_from_cache(&key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Cache read failed, treating as miss");
                None
            }
        };

        if let Some(cached) = hit {
            tracing::debug!(key = %key, "Cache hit");
            Ok(cached)
        } else {
            tracing::debug!(key = %key, "Cache miss");
            let value = $block.await?;
            $cache.set_in_background(&key, &value, $ttl);
            Ok(value)
        }
    }};
}
