use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use productdb_common::util::now_ms;
use productdb_common::WorkerState;
use productdb_meta::{list_json, put_json, SharedMetaStore};

pub const WORKERS_PREFIX: &str = "/workers/";

/// One entry of a worker snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerDescriptor {
    pub hostname: String,
    pub alive: bool,
}

/// Source of the known backend workers and their liveness.
#[async_trait]
pub trait WorkerRegistry: Send + Sync {
    async fn workers(&self) -> Result<Vec<WorkerDescriptor>>;
}

/// Registry backed by heartbeat records under `/workers/`.
#[derive(Clone)]
pub struct MetaWorkerRegistry {
    store: SharedMetaStore,
    heartbeat_timeout: Duration,
}

impl MetaWorkerRegistry {
    pub fn new(store: SharedMetaStore, heartbeat_timeout: Duration) -> Self {
        Self {
            store,
            heartbeat_timeout,
        }
    }

    /// Record a heartbeat for `state.hostname`.
    pub async fn publish(&self, state: &WorkerState) -> Result<()> {
        put_json(self.store.as_ref(), &state.key(), state, None).await?;
        Ok(())
    }

    pub async fn remove(&self, hostname: &str) -> Result<()> {
        self.store.delete(&format!("{}{}", WORKERS_PREFIX, hostname)).await?;
        Ok(())
    }
}

#[async_trait]
impl WorkerRegistry for MetaWorkerRegistry {
    async fn workers(&self) -> Result<Vec<WorkerDescriptor>> {
        let now = now_ms();
        let timeout_ms = self.heartbeat_timeout.as_millis() as u64;
        let states: Vec<WorkerState> = list_json(self.store.as_ref(), WORKERS_PREFIX).await?;
        Ok(states
            .into_iter()
            .map(|w| WorkerDescriptor {
                alive: w.is_alive(now, timeout_ms),
                hostname: w.hostname,
            })
            .collect())
    }
}
