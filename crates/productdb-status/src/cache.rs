use std::time::Duration;

use anyhow::Result;

use productdb_meta::{get_json, put_json, SharedMetaStore};

pub const CISCO_EOX_API_TEST: &str = "CISCO_EOX_API_TEST";

pub fn cache_key(name: &str) -> String {
    format!("/cache/{}", name)
}

/// The cached outcome of the last completed API reachability check.
#[derive(Clone)]
pub struct ApiReachabilityCache {
    store: SharedMetaStore,
    ttl: Option<Duration>,
}

impl std::fmt::Debug for ApiReachabilityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiReachabilityCache")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl ApiReachabilityCache {
    /// `ttl = None` keeps a value until it is cleared.
    pub fn new(store: SharedMetaStore, ttl: Option<Duration>) -> Self {
        Self { store, ttl }
    }

    pub async fn get(&self) -> Result<Option<bool>> {
        get_json(self.store.as_ref(), &cache_key(CISCO_EOX_API_TEST)).await
    }

    pub async fn set(&self, reachable: bool) -> Result<()> {
        let ttl_ms = self.ttl.map(|d| d.as_millis() as u64);
        put_json(self.store.as_ref(), &cache_key(CISCO_EOX_API_TEST), &reachable, ttl_ms).await?;
        Ok(())
    }

    pub async fn delete(&self) -> Result<()> {
        self.store.delete(&cache_key(CISCO_EOX_API_TEST)).await?;
        Ok(())
    }
}
