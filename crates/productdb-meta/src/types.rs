use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// Key/value store shared by every server instance.
///
/// Values are opaque bytes; revisions are monotonically increasing per store.
#[async_trait]
pub trait MetaStore: Send + Sync {
    async fn put(&self, key: &str, value: Vec<u8>, ttl_ms: Option<u64>) -> Result<u64>;
    async fn get(&self, key: &str) -> Result<Option<(Vec<u8>, u64)>>;
    async fn delete(&self, key: &str) -> Result<u64>;
    async fn list_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>, u64)>>;
}

pub type SharedMetaStore = Arc<dyn MetaStore>;

/// Serialize `value` as JSON and store it under `key`.
pub async fn put_json<T: Serialize + ?Sized>(
    store: &dyn MetaStore,
    key: &str,
    value: &T,
    ttl_ms: Option<u64>,
) -> Result<u64> {
    let bytes = serde_json::to_vec(value)?;
    store.put(key, bytes, ttl_ms).await
}

/// Read `key` and decode it as JSON. A missing key yields `Ok(None)`.
pub async fn get_json<T: DeserializeOwned>(store: &dyn MetaStore, key: &str) -> Result<Option<T>> {
    match store.get(key).await? {
        Some((bytes, _)) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// List every value under `prefix`, skipping entries that fail to decode.
pub async fn list_json<T: DeserializeOwned>(store: &dyn MetaStore, prefix: &str) -> Result<Vec<T>> {
    let raw = store.list_prefix(prefix).await?;
    let mut out = Vec::with_capacity(raw.len());
    for (_, v, _) in raw {
        if let Ok(item) = serde_json::from_slice::<T>(&v) {
            out.push(item);
        }
    }
    Ok(out)
}
