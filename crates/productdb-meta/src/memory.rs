use std::{collections::BTreeMap, sync::Arc, time::Duration};

use anyhow::Result;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::types::MetaStore;

/// In-process store used for single-instance deployments and tests.
///
/// TTLs are honoured lazily: an expired entry is invisible to reads and is
/// dropped on the next write that touches the map.
#[derive(Debug, Clone, Default)]
pub struct MemoryMetaStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    revision: u64,
    kv: BTreeMap<String, Entry>,
}

#[derive(Debug)]
struct Entry {
    value: Vec<u8>,
    revision: u64,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

impl MemoryMetaStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_revision(inner: &mut Inner) -> u64 {
        inner.revision = inner.revision.saturating_add(1);
        inner.revision
    }

    fn purge_expired(inner: &mut Inner, now: Instant) {
        inner.kv.retain(|_, e| e.is_live(now));
    }
}

#[async_trait::async_trait]
impl MetaStore for MemoryMetaStore {
    async fn put(&self, key: &str, value: Vec<u8>, ttl_ms: Option<u64>) -> Result<u64> {
        let now = Instant::now();
        let mut inner = self.inner.write().await;
        Self::purge_expired(&mut inner, now);
        let rev = Self::next_revision(&mut inner);
        let expires_at = ttl_ms.map(|ms| now + Duration::from_millis(ms));
        inner.kv.insert(
            key.to_string(),
            Entry {
                value,
                revision: rev,
                expires_at,
            },
        );
        Ok(rev)
    }

    async fn get(&self, key: &str) -> Result<Option<(Vec<u8>, u64)>> {
        let now = Instant::now();
        let inner = self.inner.read().await;
        Ok(inner
            .kv
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| (e.value.clone(), e.revision)))
    }

    async fn delete(&self, key: &str) -> Result<u64> {
        let mut inner = self.inner.write().await;
        inner.kv.remove(key);
        Ok(Self::next_revision(&mut inner))
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>, u64)>> {
        let now = Instant::now();
        let inner = self.inner.read().await;
        let out = inner
            .kv
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .filter(|(_, e)| e.is_live(now))
            .map(|(k, e)| (k.clone(), e.value.clone(), e.revision))
            .collect();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{get_json, list_json, put_json};

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryMetaStore::new();
        let r1 = store.put("/cache/a", b"true".to_vec(), None).await.unwrap();
        let (v, rev) = store.get("/cache/a").await.unwrap().unwrap();
        assert_eq!(v, b"true");
        assert_eq!(rev, r1);

        let r2 = store.delete("/cache/a").await.unwrap();
        assert!(r2 > r1);
        assert!(store.get("/cache/a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_ok() {
        let store = MemoryMetaStore::new();
        assert!(store.delete("/nope").await.is_ok());
    }

    #[tokio::test]
    async fn test_list_prefix_is_bounded() {
        let store = MemoryMetaStore::new();
        store.put("/workers/a", b"1".to_vec(), None).await.unwrap();
        store.put("/workers/b", b"2".to_vec(), None).await.unwrap();
        store.put("/workersx", b"3".to_vec(), None).await.unwrap();
        store.put("/notifications/1", b"4".to_vec(), None).await.unwrap();

        let keys: Vec<String> = store
            .list_prefix("/workers/")
            .await
            .unwrap()
            .into_iter()
            .map(|(k, _, _)| k)
            .collect();
        assert_eq!(keys, vec!["/workers/a", "/workers/b"]);
    }

    #[tokio::test]
    async fn test_ttl_expires_entry() {
        let store = MemoryMetaStore::new();
        store.put("/cache/t", b"false".to_vec(), Some(30)).await.unwrap();
        assert!(store.get("/cache/t").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(store.get("/cache/t").await.unwrap().is_none());
        assert!(store.list_prefix("/cache/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let store = MemoryMetaStore::new();
        put_json(&store, "/cache/flag", &true, None).await.unwrap();
        assert_eq!(get_json::<bool>(&store, "/cache/flag").await.unwrap(), Some(true));
        assert_eq!(get_json::<bool>(&store, "/cache/missing").await.unwrap(), None);

        store.put("/cache/broken", b"{not json".to_vec(), None).await.unwrap();
        let flags: Vec<bool> = list_json(&store, "/cache/").await.unwrap();
        assert_eq!(flags, vec![true]);
    }
}
