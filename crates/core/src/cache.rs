//! Advisory read-through cache over the SQLite store.
//!
//! Providers consult this cache before every outbound call and populate it
//! afterwards. It is strictly an optimization: when the backing store is
//! absent or errors, `get` reports a miss and `set`/`delete` do nothing,
//! and the provider call proceeds as if uncached. Store errors are logged
//! at warn level and never propagated.

use crate::store::StoreDb;

/// Read-through TTL cache handle shared by all providers.
#[derive(Clone, Debug, Default)]
pub struct CacheStore {
    store: Option<StoreDb>,
}

impl CacheStore {
    /// Create a cache backed by the given store, or a no-op cache when
    /// `store` is None.
    pub fn new(store: Option<StoreDb>) -> Self {
        Self { store }
    }

    /// Create a cache that never hits and never stores.
    pub fn disabled() -> Self {
        Self { store: None }
    }

    /// Whether a backing store is attached.
    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Look up a live entry. Absent key, expired entry, disabled cache and
    /// store failure all report a miss.
    pub async fn get(&self, key: &str) -> Option<String> {
        let store = self.store.as_ref()?;
        match store.kv_get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache get failed");
                None
            }
        }
    }

    /// Store a value under `key` for `ttl_seconds`. A failure is logged and
    /// otherwise ignored.
    pub async fn set(&self, key: &str, value: &str, ttl_seconds: i64) {
        let Some(store) = self.store.as_ref() else { return };
        if let Err(e) = store.kv_set(key, value, ttl_seconds).await {
            tracing::warn!(key, error = %e, "cache set failed");
        }
    }

    /// Remove a value. A failure is logged and otherwise ignored.
    pub async fn delete(&self, key: &str) {
        let Some(store) = self.store.as_ref() else { return };
        if let Err(e) = store.kv_delete(key).await {
            tracing::warn!(key, error = %e, "cache delete failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roundtrip() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let cache = CacheStore::new(Some(db));

        cache.set("answer", "forty-two", 300).await;
        assert_eq!(cache.get("answer").await.as_deref(), Some("forty-two"));

        cache.delete("answer").await;
        assert!(cache.get("answer").await.is_none());
    }

    #[tokio::test]
    async fn test_disabled_cache_is_a_no_op() {
        let cache = CacheStore::disabled();
        assert!(!cache.is_enabled());

        cache.set("key", "value", 300).await;
        assert!(cache.get("key").await.is_none());
        cache.delete("key").await;
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let cache = CacheStore::new(Some(db));

        cache.set("ephemeral", "value", 1).await;
        tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;
        assert!(cache.get("ephemeral").await.is_none());
    }
}
