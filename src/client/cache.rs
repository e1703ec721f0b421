//! Scoped query cache for API consumers.
//!
//! A `QueryCache` is created by whoever owns a client session and handed to
//! the consumers that need it. Clones share the same storage. Entries are
//! dropped by explicit invalidation after a successful mutation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use tracing::{debug, trace};

/// Hierarchical cache key, e.g. `["users", "list", "0"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// Key of the signed-in user's profile.
    pub fn profile() -> Self {
        Self::new(["auth", "profile"])
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

/// Which entries an invalidation drops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    Exact(QueryKey),
    Prefix(QueryKey),
}

#[derive(Debug, Clone)]
struct CachedEntry {
    value: serde_json::Value,
    stored_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct QueryCache {
    entries: Arc<DashMap<QueryKey, CachedEntry>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let entry = self.entries.get(key)?;
        match serde_json::from_value(entry.value.clone()) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(key = ?key.parts(), error = %e, "cached entry has unexpected shape");
                None
            }
        }
    }

    /// When the entry under `key` was stored, if present.
    pub fn stored_at(&self, key: &QueryKey) -> Option<DateTime<Utc>> {
        self.entries.get(key).map(|entry| entry.stored_at)
    }

    pub fn set<T: Serialize>(&self, key: QueryKey, value: &T) -> crate::Result<()> {
        let value = serde_json::to_value(value)?;
        trace!(key = ?key.parts(), "cache set");
        self.entries.insert(key, CachedEntry { value, stored_at: Utc::now() });
        Ok(())
    }

    /// Return the cached value or run `fetch` and cache its result.
    ///
    /// Fetch errors are returned as-is and nothing is cached.
    pub async fn get_or_fetch<T, F, Fut, E>(&self, key: QueryKey, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let value = fetch().await?;
        if let Err(e) = self.set(key, &value) {
            debug!(error = %e, "fetched value could not be cached");
        }
        Ok(value)
    }

    /// Drop matching entries; returns how many were removed.
    pub fn invalidate(&self, invalidation: &Invalidation) -> usize {
        let removed = match invalidation {
            Invalidation::Exact(key) => usize::from(self.entries.remove(key).is_some()),
            Invalidation::Prefix(prefix) => {
                let before = self.entries.len();
                self.entries.retain(|key, _| !key.starts_with(prefix));
                before - self.entries.len()
            }
        };
        debug!(?invalidation, removed, "cache invalidated");
        removed
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_and_prefix_invalidation() {
        let cache = QueryCache::new();
        cache.set(QueryKey::new(["users", "list", "0"]), &vec!["a", "b"]).unwrap();
        cache.set(QueryKey::new(["users", "list", "1"]), &vec!["c"]).unwrap();
        cache.set(QueryKey::new(["users", "detail", "42"]), &"alice").unwrap();
        cache.set(QueryKey::profile(), &"me").unwrap();

        assert_eq!(cache.invalidate(&Invalidation::Exact(QueryKey::new(["users", "list"]))), 0);
        assert_eq!(cache.invalidate(&Invalidation::Prefix(QueryKey::new(["users", "list"]))), 2);
        assert_eq!(cache.len(), 2);

        assert_eq!(cache.invalidate(&Invalidation::Exact(QueryKey::profile())), 1);
        assert_eq!(cache.get::<String>(&QueryKey::new(["users", "detail", "42"])).unwrap(), "alice");
    }

    #[test]
    fn prefix_is_segment_based() {
        let cache = QueryCache::new();
        cache.set(QueryKey::new(["users"]), &1).unwrap();
        cache.set(QueryKey::new(["usersettings"]), &2).unwrap();

        cache.invalidate(&Invalidation::Prefix(QueryKey::new(["users"])));
        assert!(cache.get::<i32>(&QueryKey::new(["users"])).is_none());
        assert_eq!(cache.get::<i32>(&QueryKey::new(["usersettings"])), Some(2));
    }

    #[test]
    fn clones_share_entries() {
        let cache = QueryCache::new();
        let other = cache.clone();
        other.set(QueryKey::profile(), &"me").unwrap();
        assert_eq!(cache.get::<String>(&QueryKey::profile()).unwrap(), "me");
        assert!(cache.stored_at(&QueryKey::profile()).is_some());
    }

    #[tokio::test]
    async fn get_or_fetch_only_fetches_on_miss() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let cache = QueryCache::new();
        let key = QueryKey::new(["users", "count"]);
        let calls = AtomicUsize::new(0);
        let fetch = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<i64, String>(3)
        };

        assert_eq!(cache.get_or_fetch(key.clone(), fetch).await.unwrap(), 3);
        assert_eq!(cache.get_or_fetch(key.clone(), fetch).await.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache.clear();
        let failed: Result<i64, String> =
            cache.get_or_fetch(key.clone(), || async { Err("offline".to_string()) }).await;
        assert!(failed.is_err());
        assert!(cache.is_empty());
    }
}
