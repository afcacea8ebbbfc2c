use std::sync::Arc;

use anyhow::Result;
use etcd_client::{Client, GetOptions, PutOptions};
use tokio::sync::Mutex;

use crate::types::MetaStore;

/// etcd-backed store, shared by all server instances of one deployment.
#[derive(Clone)]
pub struct EtcdMetaStore {
    client: Arc<Mutex<Client>>,
}

impl EtcdMetaStore {
    pub async fn connect(endpoints: &[String]) -> Result<Self> {
        let c = Client::connect(endpoints, None).await?;
        Ok(Self {
            client: Arc::new(Mutex::new(c)),
        })
    }

    // etcd leases are whole seconds with a minimum of one.
    fn ttl_to_seconds(ttl_ms: u64) -> i64 {
        let secs = ttl_ms.div_ceil(1000) as i64;
        secs.max(1)
    }
}

#[async_trait::async_trait]
impl MetaStore for EtcdMetaStore {
    async fn put(&self, key: &str, value: Vec<u8>, ttl_ms: Option<u64>) -> Result<u64> {
        let mut cli = self.client.lock().await;

        let mut opts = PutOptions::new();
        if let Some(ttl_ms) = ttl_ms {
            let lease = cli.lease_grant(Self::ttl_to_seconds(ttl_ms), None).await?;
            opts = opts.with_lease(lease.id());
        }

        let resp = cli.put(key, value, Some(opts)).await?;
        let rev = resp.header().map(|h| h.revision()).unwrap_or_default();
        Ok(rev as u64)
    }

    async fn get(&self, key: &str) -> Result<Option<(Vec<u8>, u64)>> {
        let mut cli = self.client.lock().await;
        let resp = cli.get(key, None).await?;
        Ok(resp
            .kvs()
            .first()
            .map(|kv| (kv.value().to_vec(), kv.mod_revision() as u64)))
    }

    async fn delete(&self, key: &str) -> Result<u64> {
        let mut cli = self.client.lock().await;
        let resp = cli.delete(key, None).await?;
        let rev = resp.header().map(|h| h.revision()).unwrap_or_default();
        Ok(rev as u64)
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>, u64)>> {
        let mut cli = self.client.lock().await;
        let resp = cli.get(prefix, Some(GetOptions::new().with_prefix())).await?;

        let out = resp
            .kvs()
            .iter()
            .map(|kv| {
                (
                    String::from_utf8_lossy(kv.key()).to_string(),
                    kv.value().to_vec(),
                    kv.mod_revision() as u64,
                )
            })
            .collect();
        Ok(out)
    }
}
